//! Reply details and rule summaries.
//!
//! [`Engine::reply`](crate::Engine::reply) returns only the text;
//! [`Engine::reply_verbose`](crate::Engine::reply_verbose) returns a
//! [`ReplyDetails`] for debugging which rule fired and why a reply was empty.

use super::Rule;
use std::time::Duration;

/// How a reply was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A rule matched and its handler returned the reply (which may be empty).
    Replied,
    /// No rule matched the input.
    NoMatch,
    /// The matching rule's handler failed; the reply is empty.
    HandlerFailed,
    /// The nesting limit was reached; the reply is empty.
    DepthExceeded,
}

#[derive(Debug, Clone)]
pub struct ReplyDetails {
    pub reply: String,
    /// The input after normalization. Empty when the input was never normalized.
    pub normalized: String,
    /// Diagnostic name of the rule that matched.
    pub rule: Option<String>,
    /// Number of rules tested before a match (or all of them).
    pub considered: usize,
    pub depth: usize,
    pub outcome: Outcome,
    pub elapsed: Duration,
}

/// One row of [`Engine::rule_table`](crate::Engine::rule_table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSummary {
    pub topic: String,
    pub rule: String,
    pub pattern: String,
    pub previous: Option<String>,
    pub weight: i32,
    pub score: u32,
    /// False when the rule's regex could not be built; such rules never match.
    pub cached: bool,
}

impl RuleSummary {
    pub(crate) fn new(topic: &str, rule: &Rule) -> Self {
        RuleSummary {
            topic: topic.to_string(),
            rule: rule.name().to_string(),
            pattern: rule.formatted_pattern().to_string(),
            previous: rule.formatted_previous().map(str::to_string),
            weight: rule.weight(),
            score: rule.score(),
            cached: rule.is_cached(),
        }
    }
}
