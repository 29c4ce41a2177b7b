//! Reply resolution.
//!
//! ```text
//! reply(user, message, depth)
//!   depth >= limit ─────────────▶ ""            (refused, logged)
//!   set_user + build_cache
//!   Target::new(message)
//!   for rule in "all" by priority:
//!       previous precondition? pattern matches?
//!         └─ first hit: handler(Turn) ──▶ Ok(text)  ──▶ text
//!                                     └─▶ Err(e)    ──▶ ""  (logged, no fallthrough)
//!   no hit ──────────────────────▶ ""
//! ```
//!
//! A handler receives a [`Turn`] and may call [`Turn::reply`], which re-enters
//! the engine one level deeper.

use super::metrics::{Outcome, ReplyDetails};
use super::vars::topic_in;
use super::Engine;
use crate::{DEFAULT_TOPIC, HandlerError, Matches, Target, Vars};
use once_cell::sync::Lazy;
use std::time::Instant;

static NO_VARS: Lazy<Vars> = Lazy::new(Vars::new);

impl Engine {
    /// Reply to `message` from `user`. Empty when no rule matched, the matching
    /// rule's handler failed, or nothing else could be said.
    pub fn reply(&mut self, user: &str, message: &str) -> String {
        self.reply_at(user, message, 0).reply
    }

    /// Like [`reply`](Self::reply), with details about how the reply was chosen.
    pub fn reply_verbose(&mut self, user: &str, message: &str) -> ReplyDetails {
        self.reply_at(user, message, 0)
    }

    pub(crate) fn reply_at(&mut self, user: &str, message: &str, depth: usize) -> ReplyDetails {
        let start = Instant::now();
        self.say(format!("Asked to reply to: \"{message}\" from {user}"));

        if depth >= self.config.depth_limit {
            self.warn(format!(
                "Refusing to reply to \"{message}\" from {user}: recursion depth limit of {} reached",
                self.config.depth_limit
            ));
            return ReplyDetails {
                reply: String::new(),
                normalized: String::new(),
                rule: None,
                considered: 0,
                depth,
                outcome: Outcome::DepthExceeded,
                elapsed: start.elapsed(),
            };
        }

        self.set_user(user);
        self.build_cache();

        let target = Target::new(message, &self.config.substitutions);
        self.say(format!("Normalized message to \"{}\"", target.normalized));

        let previous = self.users.get(user).and_then(|state| state.previous.clone());
        let mut considered = 0;
        let found = self.topics.get(DEFAULT_TOPIC).and_then(|topic| {
            topic.sorted_rules().find_map(|rule| {
                considered += 1;
                rule.matches(&target.normalized, previous.as_deref())
                    .map(|matches| (rule.name().to_string(), rule.handler().clone(), matches))
            })
        });

        let (reply, rule, outcome) = match found {
            None => (String::new(), None, Outcome::NoMatch),
            Some((name, handler, matches)) => {
                self.say(format!("Found pattern match, rule {name}"));
                let mut turn = Turn { engine: &mut *self, user, depth, matches };
                match (handler)(&mut turn) {
                    Ok(reply) => (reply, Some(name), Outcome::Replied),
                    Err(err) => {
                        self.error(format!("Rule {name} failed: {err}"));
                        (String::new(), Some(name), Outcome::HandlerFailed)
                    }
                }
            }
        };

        if reply.is_empty() {
            self.say("Empty reply generated");
        } else if depth == 0 {
            let remembered = Target::new(&reply, &self.config.substitutions).normalized;
            self.user_state(user).previous = Some(remembered);
        }

        ReplyDetails {
            reply,
            normalized: target.normalized,
            rule,
            considered,
            depth,
            outcome,
            elapsed: start.elapsed(),
        }
    }
}

/// What a handler sees while it runs: the match state for this rule, the
/// variable stores, and the engine for nested replies.
pub struct Turn<'e> {
    engine: &'e mut Engine,
    user: &'e str,
    depth: usize,
    matches: Matches,
}

impl Turn<'_> {
    pub fn user(&self) -> &str {
        self.user
    }

    /// Nesting depth of this reply; 0 for a reply requested by the caller.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn matches(&self) -> &Matches {
        &self.matches
    }

    /// Capture group `index` of the current match.
    pub fn group(&self, index: usize) -> Option<&str> {
        self.matches.get(&index).map(String::as_str)
    }

    /// Like [`group`](Self::group), failing the handler when the group is absent.
    pub fn require(&self, index: usize) -> Result<&str, HandlerError> {
        self.group(index).ok_or(HandlerError::MissingGroup(index))
    }

    pub fn botvars(&self) -> &Vars {
        &self.engine.botvars
    }

    pub fn botvars_mut(&mut self) -> &mut Vars {
        &mut self.engine.botvars
    }

    pub fn uservars(&self) -> &Vars {
        self.engine.uservars(self.user).unwrap_or(&*NO_VARS)
    }

    pub fn uservars_mut(&mut self) -> &mut Vars {
        self.engine.uservars_mut(self.user)
    }

    pub fn topic(&self) -> &str {
        topic_in(self.uservars())
    }

    pub fn set_topic(&mut self, topic: &str) {
        self.engine.set_topic(self.user, topic);
    }

    /// Reply to `message` as if the same user had said it, one level deeper.
    /// Empty once the depth limit is reached.
    pub fn reply(&mut self, message: &str) -> String {
        let user = self.user;
        self.engine.reply_at(user, message, self.depth + 1).reply
    }
}
