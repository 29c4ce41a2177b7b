use std::path::PathBuf;
use thiserror::Error;

/// Failures of the pattern grammar: parsing a pattern or rendering it to a regex.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PatternError {
    #[error("pattern syntax error in \"{pattern}\" at {position}: {message}")]
    Syntax { pattern: String, position: usize, message: String },

    #[error("pattern references unknown alternate \"{0}\"")]
    UnknownAlternate(String),

    #[error("alternate \"{name}\" is not a valid pattern fragment: {message}")]
    BadAlternate { name: String, message: String },

    #[error("rendered pattern is not a valid regex: {0}")]
    Regex(String),
}

impl From<regex::Error> for PatternError {
    fn from(err: regex::Error) -> Self {
        PatternError::Regex(err.to_string())
    }
}

/// Which of a rule's two pattern strings a [`RuleError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternField {
    Pattern,
    Previous,
}

impl std::fmt::Display for PatternField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternField::Pattern => f.write_str("pattern"),
            PatternField::Previous => f.write_str("previous pattern"),
        }
    }
}

/// A rule could not be constructed from its declaration.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{source} in {field} of {rule}")]
pub struct RuleError {
    pub rule: String,
    pub field: PatternField,
    pub source: PatternError,
}

/// A handler failed while producing a reply.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HandlerError {
    #[error("{0}")]
    Failed(String),

    #[error("no capture group {0} in the current match")]
    MissingGroup(usize),
}

/// A script could not be discovered, read or instantiated.
#[derive(Error, Debug)]
pub enum ScriptLoadError {
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to parse {}: {source}", path.display())]
    Json { path: PathBuf, source: serde_json::Error },

    #[error("invalid script {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },

    #[error("failed to instantiate script {name}: {message}")]
    Instantiate { name: String, message: String },
}

/// Non-fatal problems found while loading scripts. Loading always continues.
#[derive(Error, Debug)]
pub enum LoadIssue {
    #[error("failed to load script: {0}")]
    Script(#[from] ScriptLoadError),

    #[error("rule rejected: {0}")]
    Rule(#[from] RuleError),

    #[error(
        "ignoring pattern \"{pattern}\",\"{previous}\" at {rule} because it is a duplicate of the pattern of {existing} for the topic \"{topic}\""
    )]
    DuplicateRule { topic: String, pattern: String, previous: String, rule: String, existing: String },

    #[error("{script}: {kind} declaration \"{name}\" is not supported and was ignored")]
    Unsupported { script: String, kind: &'static str, name: String },

    #[error("no rules were found in {0}")]
    NoRules(String),
}
