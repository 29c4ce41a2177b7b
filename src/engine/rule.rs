//! Compiled pattern rules.
//!
//! A `Rule` is built once per load from a script's declaration. Parsing happens
//! at construction (so syntax errors reject the rule outright), while regex
//! rendering waits for [`Rule::cache_regexes`] because it depends on the
//! alternates of the owning topic.
//!
//! ## Priority
//!
//! Rules compare by `weight`, then by `score`. Handler and name do not take
//! part, so two rules with equal weight and score compare equal; the topic
//! keeps such ties in load order.

use crate::pattern::{Alternates, GROUP_PREFIX, PatternAst, PatternGrammar};
use crate::{Handler, Matches, PatternError, PatternField, RuleError};
use regex::Regex;
use std::cmp::Ordering;

/// Canonical identity of a rule inside a topic: formatted pattern and formatted previous pattern.
pub(crate) type RuleKey = (String, Option<String>);

#[derive(Debug)]
struct CompiledRegexes {
    pattern: Regex,
    previous: Option<Regex>,
}

pub struct Rule {
    name: String,
    weight: i32,
    score: u32,
    formatted_pattern: String,
    formatted_previous: Option<String>,
    pattern: PatternAst,
    previous: Option<PatternAst>,
    handler: Handler,
    compiled: Option<CompiledRegexes>,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.formatted_pattern)
            .field("previous", &self.formatted_previous)
            .field("weight", &self.weight)
            .field("score", &self.score)
            .field("handler", &"<function>")
            .field("cached", &self.compiled.is_some())
            .finish()
    }
}

impl Rule {
    /// Parse `pattern` and `previous` (empty means no precondition).
    ///
    /// `name` is the diagnostic identity, usually `script.rule`.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        previous: &str,
        weight: i32,
        handler: Handler,
        grammar: &dyn PatternGrammar,
    ) -> Result<Self, RuleError> {
        let name = name.into();

        let pattern = grammar
            .parse(pattern)
            .map_err(|source| RuleError { rule: name.clone(), field: PatternField::Pattern, source })?;
        let previous = if previous.trim().is_empty() {
            None
        } else {
            Some(
                grammar
                    .parse(previous)
                    .map_err(|source| RuleError { rule: name.clone(), field: PatternField::Previous, source })?,
            )
        };

        Ok(Rule {
            formatted_pattern: grammar.format(&pattern),
            formatted_previous: previous.as_ref().map(|ast| grammar.format(ast)),
            score: grammar.score(&pattern),
            name,
            weight,
            pattern,
            previous,
            handler,
            compiled: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn weight(&self) -> i32 {
        self.weight
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn formatted_pattern(&self) -> &str {
        &self.formatted_pattern
    }

    pub fn formatted_previous(&self) -> Option<&str> {
        self.formatted_previous.as_deref()
    }

    /// Whether the last [`cache_regexes`](Self::cache_regexes) succeeded.
    pub fn is_cached(&self) -> bool {
        self.compiled.is_some()
    }

    pub(crate) fn key(&self) -> RuleKey {
        (self.formatted_pattern.clone(), self.formatted_previous.clone())
    }

    pub(crate) fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Render and compile the pattern and previous pattern against `alternates`.
    ///
    /// On failure the rule is left without regexes and will not match until a
    /// later call succeeds.
    pub fn cache_regexes(&mut self, grammar: &dyn PatternGrammar, alternates: &Alternates) -> Result<(), PatternError> {
        self.compiled = None;
        let pattern = compile(grammar, &self.pattern, alternates)?;
        let previous = match &self.previous {
            Some(ast) => Some(compile(grammar, ast, alternates)?),
            None => None,
        };
        self.compiled = Some(CompiledRegexes { pattern, previous });
        Ok(())
    }

    /// Match the normalized input, checking the previous-pattern precondition
    /// against `previous` (the normalized text of the last reply, if any).
    ///
    /// Returns the capture groups on success. Uncached rules never match.
    pub fn matches(&self, normalized: &str, previous: Option<&str>) -> Option<Matches> {
        let compiled = self.compiled.as_ref()?;

        if let Some(previous_re) = &compiled.previous {
            if !previous.is_some_and(|text| previous_re.is_match(text)) {
                return None;
            }
        }

        let caps = compiled.pattern.captures(normalized)?;
        let mut matches = Matches::new();
        for name in compiled.pattern.capture_names().flatten() {
            let Some(index) = name.strip_prefix(GROUP_PREFIX).and_then(|n| n.parse::<usize>().ok()) else {
                continue;
            };
            if let Some(m) = caps.name(name) {
                matches.insert(index, m.as_str().to_string());
            }
        }
        Some(matches)
    }
}

fn compile(grammar: &dyn PatternGrammar, ast: &PatternAst, alternates: &Alternates) -> Result<Regex, PatternError> {
    let body = grammar.render(ast, alternates)?;
    Ok(Regex::new(&format!("^(?:{body})$"))?)
}

impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.score == other.score
    }
}

impl Eq for Rule {}

impl PartialOrd for Rule {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rule {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight.cmp(&other.weight).then(self.score.cmp(&other.score))
    }
}
