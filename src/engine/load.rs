//! Script loading.
//!
//! Loading replaces the whole rule registry: every topic is dropped, the
//! default topic is recreated with the built-in alternates, and each script the
//! source yields is set up and asked for its declarations. Variable stores are
//! left alone.
//!
//! Nothing here is fatal. A script that fails to load, a rule that fails to
//! parse or a duplicate rule is logged, recorded in the [`LoadReport`], and
//! loading carries on with the rest.

use super::Engine;
use super::rule::Rule;
use super::topic::Insert;
use crate::script::{Declaration, RuleSpec, Script, ScriptSource};
use crate::{DEFAULT_TOPIC, LoadIssue};

/// Summary of one [`Engine::load_scripts`] run.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Description of the source, e.g. its directory.
    pub source: String,
    /// Scripts that were instantiated and scanned.
    pub scripts: usize,
    /// Rules registered across all topics.
    pub rules: usize,
    pub issues: Vec<LoadIssue>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

impl Engine {
    /// Replace all topics and rules with the scripts yielded by `source`.
    pub fn load_scripts(&mut self, source: &dyn ScriptSource) -> LoadReport {
        let mut report = LoadReport { source: source.describe(), ..LoadReport::default() };
        self.say(format!("Loading from {}", report.source));

        self.reset_topics();

        for loaded in source.scripts() {
            match loaded {
                Ok(script) => self.load_script(script, &mut report),
                Err(err) => self.record(&mut report, err.into()),
            }
        }

        report.rules = self.rule_count();
        if report.rules == 0 {
            let issue = LoadIssue::NoRules(report.source.clone());
            self.record(&mut report, issue);
        }
        report
    }

    fn load_script(&mut self, mut script: Box<dyn Script>, report: &mut LoadReport) {
        self.say(format!("Loading scripts from {}", script.name()));

        let topic = match script.topic().trim() {
            "" => DEFAULT_TOPIC.to_string(),
            name => name.to_string(),
        };
        self.ensure_topic(&topic);

        script.setup(&mut self.botvars);
        report.scripts += 1;

        let script_name = script.name().to_string();
        for declaration in script.declare() {
            match declaration {
                Declaration::Pattern(spec) => self.load_pattern(&topic, &script_name, spec, report),
                Declaration::Alternate { name, .. } => {
                    let issue = LoadIssue::Unsupported { script: script_name.clone(), kind: "alternate", name };
                    self.record(report, issue);
                }
                Declaration::Substitute { word, .. } => {
                    let issue = LoadIssue::Unsupported { script: script_name.clone(), kind: "substitute", name: word };
                    self.record(report, issue);
                }
            }
        }
    }

    fn load_pattern(&mut self, topic: &str, script_name: &str, spec: RuleSpec, report: &mut LoadReport) {
        let rule_name = format!("{script_name}.{}", spec.name);
        let built = Rule::new(&rule_name, &spec.pattern, &spec.previous, spec.weight, spec.handler, self.grammar.as_ref());
        let rule = match built {
            Ok(rule) => rule,
            Err(err) => return self.record(report, err.into()),
        };

        let inserted = self.ensure_topic(topic).insert(rule);
        match inserted {
            Insert::Added => self.say(format!(
                "Loaded pattern \"{}\", previous=\"{}\", weight={}, rule = {rule_name}",
                spec.pattern, spec.previous, spec.weight
            )),
            Insert::AlreadyPresent => {}
            Insert::Conflict { existing } => {
                let issue = LoadIssue::DuplicateRule {
                    topic: topic.to_string(),
                    pattern: spec.pattern,
                    previous: spec.previous,
                    rule: rule_name,
                    existing,
                };
                self.record(report, issue);
            }
        }
    }

    /// Log `issue` at the level its kind calls for and keep it in the report.
    fn record(&self, report: &mut LoadReport, issue: LoadIssue) {
        match &issue {
            LoadIssue::Unsupported { .. } => self.say(&issue),
            LoadIssue::DuplicateRule { .. } => self.warn(&issue),
            LoadIssue::Script(_) | LoadIssue::Rule(_) | LoadIssue::NoRules(_) => self.error(&issue),
        }
        report.issues.push(issue);
    }
}
