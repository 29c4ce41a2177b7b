//! Reply engine.
//!
//! ## How the parts work together
//!
//! ```text
//! ScriptSource ──▶ Engine::load_scripts               (load.rs)
//!                    - reset topics, seed "all"
//!                    - Script::setup + Script::declare
//!                    - Rule::new, dedup into Topic    (rule.rs, topic.rs)
//!                               │
//!                               v
//!                  Engine::build_cache                 (this file)
//!                    - sort rules by (weight, score) descending
//!                    - render + compile regexes against the topic alternates
//!                               │
//! message ── Target::new ───────┼─ scan "all" in priority order
//!                               v
//!                  Engine::reply                       (reply.rs)
//!                    - first matching rule wins
//!                    - handler runs with a Turn (match state, vars, nested reply)
//!                               │
//!                               v
//!                            String
//! ```
//!
//! ## Responsibilities by module
//!
//! - `rule.rs`: one compiled pattern rule and its priority order.
//! - `topic.rs`: rule registry keyed by canonical pattern text, plus alternates.
//! - `load.rs`: script loading and the [`LoadReport`].
//! - `reply.rs`: reply resolution, recursion bound and [`Turn`].
//! - `vars.rs`: bot-wide and per-user variable stores.
//! - `say.rs`: the debug and warning/error log sinks.
//! - `metrics.rs`: per-reply details and rule summaries for diagnostics.
//!
//! ## Open behavior
//!
//! Replies are always selected from the `"all"` topic. The user's current topic
//! is tracked (and reset to `"all"` when it disappears) but it does not narrow
//! the candidate rules.

#[path = "engine/load.rs"]
mod load;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/reply.rs"]
mod reply;
#[path = "engine/rule.rs"]
mod rule;
#[path = "engine/say.rs"]
mod say;
#[path = "engine/topic.rs"]
mod topic;
#[path = "engine/vars.rs"]
mod vars;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub use load::LoadReport;
pub use metrics::{Outcome, ReplyDetails, RuleSummary};
pub use reply::Turn;
pub use rule::Rule;
pub use topic::Topic;

use crate::pattern::{PatternGrammar, PatternParser};
use crate::{Config, DEBUG_KEY, DEFAULT_TOPIC, UserId, Value, Vars};
use std::collections::HashMap;
use vars::UserState;

/// Alternates every freshly loaded `"all"` topic starts with.
const BUILTIN_ALTERNATES: &[(&str, &str)] = &[("colors", "(red|green|blue)")];

pub struct Engine {
    config: Config,
    grammar: Box<dyn PatternGrammar>,
    topics: HashMap<String, Topic>,
    botvars: Vars,
    users: HashMap<UserId, UserState>,
    cache_built: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("grammar", &"<grammar>")
            .field("topics", &self.topics.keys().collect::<Vec<_>>())
            .field("users", &self.users.len())
            .field("cache_built", &self.cache_built)
            .finish()
    }
}

impl Engine {
    /// Create an engine using the bundled [`PatternParser`] grammar.
    pub fn new(config: Config) -> Self {
        Self::with_grammar(config, PatternParser)
    }

    pub fn with_grammar(config: Config, grammar: impl PatternGrammar + 'static) -> Self {
        let mut botvars = Vars::new();
        let debug = if config.debug { "True" } else { "False" };
        botvars.insert(DEBUG_KEY.to_string(), Value::String(debug.to_string()));

        let mut engine = Engine {
            config,
            grammar: Box::new(grammar),
            topics: HashMap::new(),
            botvars,
            users: HashMap::new(),
            cache_built: false,
        };
        engine.reset_topics();
        engine.say("Chatbot instance created.");
        engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.topics.get(name)
    }

    /// Names of all topics, sorted.
    pub fn topic_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.topics.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Total number of rules across all topics.
    pub fn rule_count(&self) -> usize {
        self.topics.values().map(Topic::len).sum()
    }

    /// Add or replace a named alternate in `topic`, creating the topic if needed.
    ///
    /// Takes effect at the next cache build.
    pub fn add_alternate(&mut self, topic: &str, name: impl Into<String>, value: impl Into<String>) {
        self.ensure_topic(topic).alternates_mut().insert(name.into(), value.into());
        self.cache_built = false;
    }

    /// Add a word substitution used when normalizing input.
    pub fn add_substitution(&mut self, word: impl Into<String>, replacement: impl Into<String>) {
        self.config.substitutions.insert(word.into().to_lowercase(), replacement.into());
    }

    /// Sort every topic's rules and compile their regexes.
    ///
    /// Runs at most once per load; [`reply`](Self::reply) calls it lazily, but
    /// it can be called up front to keep the first reply fast.
    pub fn build_cache(&mut self) {
        if self.cache_built {
            return;
        }

        let mut failures = Vec::new();
        for topic in self.topics.values_mut() {
            for (rule, err) in topic.build_cache(self.grammar.as_ref()) {
                failures.push((topic.name().to_string(), rule, err));
            }
        }
        for (topic, rule, err) in failures {
            self.warn(format!("Failed to cache regex for {rule} in topic \"{topic}\": {err}"));
        }

        self.cache_built = true;
    }

    /// Rules of every topic in priority order, for diagnostics.
    pub fn rule_table(&mut self) -> Vec<RuleSummary> {
        self.build_cache();
        let mut table = Vec::new();
        for name in self.topic_names() {
            if let Some(topic) = self.topics.get(name) {
                table.extend(topic.sorted_rules().map(|rule| RuleSummary::new(name, rule)));
            }
        }
        table
    }

    fn reset_topics(&mut self) {
        self.cache_built = false;
        self.topics.clear();
        let all = self.ensure_topic(DEFAULT_TOPIC);
        for (name, value) in BUILTIN_ALTERNATES {
            all.alternates_mut().insert(name.to_string(), value.to_string());
        }
    }

    fn ensure_topic(&mut self, name: &str) -> &mut Topic {
        self.topics.entry(name.to_string()).or_insert_with(|| Topic::new(name))
    }
}
