//! JSON script files.
//!
//! Every `*.json` file in the directory is one script, named after the file
//! stem and loaded in file-name order:
//!
//! ```json
//! {
//!   "topic": "all",
//!   "botvars": { "name": "Charge" },
//!   "rules": [
//!     { "pattern": "hello *", "reply": "Hi {0}, I am Charge." },
//!     { "name": "hey", "pattern": "hey *", "weight": 1, "redirect": "hello {0}" },
//!     { "pattern": "yes", "previous": "do you like *", "reply": "Me too." }
//!   ]
//! }
//! ```
//!
//! `{N}` in a `reply` or `redirect` is replaced by capture group N. A `redirect`
//! is answered by a nested reply to the expanded text. `botvars` entries are set
//! during setup unless the variable already exists. `alternates` and
//! `substitutions` maps are accepted and passed on as declarations.

use super::{Declaration, RuleSpec, Script, ScriptSource};
use crate::{DEFAULT_TOPIC, HandlerError, Matches, ScriptLoadError, Vars, handler};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectorySource { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ScriptSource for DirectorySource {
    fn describe(&self) -> String {
        format!("{}/*.json", self.dir.display())
    }

    fn scripts(&self) -> Vec<Result<Box<dyn Script>, ScriptLoadError>> {
        if !self.dir.is_dir() {
            return vec![Err(ScriptLoadError::NotADirectory(self.dir.clone()))];
        }
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(source) => return vec![Err(ScriptLoadError::Io { path: self.dir.clone(), source })],
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")))
            .collect();
        paths.sort();

        paths.iter().map(|path| FileScript::load(path).map(|s| Box::new(s) as Box<dyn Script>)).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptFile {
    #[serde(default = "default_topic")]
    topic: String,
    #[serde(default)]
    botvars: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    rules: Vec<FileRule>,
    #[serde(default)]
    alternates: BTreeMap<String, String>,
    #[serde(default)]
    substitutions: BTreeMap<String, String>,
}

fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileRule {
    name: Option<String>,
    pattern: String,
    #[serde(default)]
    previous: String,
    #[serde(default)]
    weight: i32,
    reply: Option<String>,
    redirect: Option<String>,
}

#[derive(Debug, Clone)]
enum Response {
    Reply(String),
    Redirect(String),
}

#[derive(Debug, Clone)]
struct FileRuleDef {
    name: String,
    pattern: String,
    previous: String,
    weight: i32,
    response: Response,
}

#[derive(Debug)]
struct FileScript {
    name: String,
    topic: String,
    botvars: BTreeMap<String, serde_json::Value>,
    rules: Vec<FileRuleDef>,
    alternates: BTreeMap<String, String>,
    substitutions: BTreeMap<String, String>,
}

impl FileScript {
    fn load(path: &Path) -> Result<Self, ScriptLoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScriptLoadError::Io { path: path.to_path_buf(), source })?;
        let file: ScriptFile =
            serde_json::from_str(&text).map_err(|source| ScriptLoadError::Json { path: path.to_path_buf(), source })?;

        let invalid = |message: String| ScriptLoadError::Invalid { path: path.to_path_buf(), message };
        let mut rules = Vec::with_capacity(file.rules.len());
        for (i, rule) in file.rules.into_iter().enumerate() {
            let name = rule.name.unwrap_or_else(|| format!("rule{i}"));
            let response = match (rule.reply, rule.redirect) {
                (Some(reply), None) => Response::Reply(reply),
                (None, Some(redirect)) => Response::Redirect(redirect),
                (Some(_), Some(_)) => return Err(invalid(format!("rule {name} has both \"reply\" and \"redirect\""))),
                (None, None) => return Err(invalid(format!("rule {name} needs \"reply\" or \"redirect\""))),
            };
            rules.push(FileRuleDef { name, pattern: rule.pattern, previous: rule.previous, weight: rule.weight, response });
        }

        let name = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "script".to_string());
        Ok(FileScript {
            name,
            topic: file.topic,
            botvars: file.botvars,
            rules,
            alternates: file.alternates,
            substitutions: file.substitutions,
        })
    }
}

impl Script for FileScript {
    fn name(&self) -> &str {
        &self.name
    }

    fn topic(&self) -> &str {
        &self.topic
    }

    fn setup(&mut self, botvars: &mut Vars) {
        for (key, value) in &self.botvars {
            botvars.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    fn declare(&self) -> Vec<Declaration> {
        let mut declarations: Vec<Declaration> = self
            .rules
            .iter()
            .map(|rule| {
                let response = rule.response.clone();
                Declaration::Pattern(RuleSpec {
                    name: rule.name.clone(),
                    pattern: rule.pattern.clone(),
                    previous: rule.previous.clone(),
                    weight: rule.weight,
                    handler: handler(move |turn| match &response {
                        Response::Reply(template) => expand(template, turn.matches()),
                        Response::Redirect(template) => {
                            let message = expand(template, turn.matches())?;
                            Ok(turn.reply(&message))
                        }
                    }),
                })
            })
            .collect();

        declarations.extend(
            self.alternates
                .iter()
                .map(|(name, value)| Declaration::Alternate { name: name.clone(), value: value.clone() }),
        );
        declarations.extend(self.substitutions.iter().map(|(word, replacement)| Declaration::Substitute {
            word: word.clone(),
            replacement: replacement.clone(),
        }));
        declarations
    }
}

/// Replace every `{N}` in `template` with capture group N.
fn expand(template: &str, matches: &Matches) -> Result<String, HandlerError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;
    for caps in regex!(r"\{(\d+)\}").captures_iter(template) {
        let (Some(whole), Some(index)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let index: usize = index.as_str().parse().map_err(|_| HandlerError::Failed(format!("bad group {}", whole.as_str())))?;
        let value = matches.get(&index).ok_or(HandlerError::MissingGroup(index))?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(value);
        last = whole.end();
    }
    out.push_str(&template[last..]);
    Ok(out)
}
