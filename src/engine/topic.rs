use super::rule::{Rule, RuleKey};
use crate::PatternError;
use crate::pattern::{Alternates, PatternGrammar};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of registering a rule in a [`Topic`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Insert {
    Added,
    /// Same pattern pair with the same handler; nothing changed.
    AlreadyPresent,
    /// Same pattern pair with a different handler; the existing rule is kept.
    Conflict { existing: String },
}

/// A named group of rules and the alternates their patterns may reference.
#[derive(Debug)]
pub struct Topic {
    name: String,
    /// Rules in registration order.
    rules: Vec<Rule>,
    keys: HashMap<RuleKey, usize>,
    alternates: Alternates,
    /// Indexes into `rules`, highest priority first. Filled by `build_cache`.
    sorted: Vec<usize>,
}

impl Topic {
    pub fn new(name: impl Into<String>) -> Self {
        Topic { name: name.into(), rules: Vec::new(), keys: HashMap::new(), alternates: Alternates::new(), sorted: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn alternates(&self) -> &Alternates {
        &self.alternates
    }

    pub(crate) fn alternates_mut(&mut self) -> &mut Alternates {
        &mut self.alternates
    }

    /// Rules in registration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Rules in priority order as of the last [`build_cache`](Self::build_cache).
    pub fn sorted_rules(&self) -> impl Iterator<Item = &Rule> + '_ {
        self.sorted.iter().filter_map(|&i| self.rules.get(i))
    }

    pub(crate) fn insert(&mut self, rule: Rule) -> Insert {
        let key = rule.key();
        if let Some(existing) = self.keys.get(&key).and_then(|&i| self.rules.get(i)) {
            if Arc::ptr_eq(existing.handler(), rule.handler()) {
                return Insert::AlreadyPresent;
            }
            return Insert::Conflict { existing: existing.name().to_string() };
        }
        self.keys.insert(key, self.rules.len());
        self.rules.push(rule);
        Insert::Added
    }

    /// Re-sort the rules and compile every regex against this topic's alternates.
    ///
    /// Returns the rules that could not be compiled; they stay registered but
    /// never match. Safe to call repeatedly.
    pub fn build_cache(&mut self, grammar: &dyn PatternGrammar) -> Vec<(String, PatternError)> {
        let mut sorted: Vec<usize> = (0..self.rules.len()).collect();
        // Stable sort: equal-priority rules stay in registration order.
        sorted.sort_by(|&a, &b| self.rules[b].cmp(&self.rules[a]));
        self.sorted = sorted;

        let mut failures = Vec::new();
        for rule in &mut self.rules {
            if let Err(err) = rule.cache_regexes(grammar, &self.alternates) {
                failures.push((rule.name().to_string(), err));
            }
        }
        failures
    }
}
