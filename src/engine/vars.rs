//! Variable stores.
//!
//! `botvars` is one store shared by every user and handler. Each user gets a
//! private store on first contact, seeded with the reserved [`TOPIC_KEY`]
//! entry; the engine manages only that key and leaves the rest to handlers.

use super::Engine;
use crate::{DEFAULT_TOPIC, TOPIC_KEY, Value, Vars};

#[derive(Debug, Clone)]
pub(crate) struct UserState {
    pub(crate) vars: Vars,
    /// Normalized text of the last non-empty top-level reply to this user.
    pub(crate) previous: Option<String>,
}

impl UserState {
    pub(crate) fn new() -> Self {
        let mut vars = Vars::new();
        vars.insert(TOPIC_KEY.to_string(), Value::String(DEFAULT_TOPIC.to_string()));
        UserState { vars, previous: None }
    }

    pub(crate) fn topic(&self) -> &str {
        topic_in(&self.vars)
    }

    pub(crate) fn set_topic(&mut self, topic: &str) {
        self.vars.insert(TOPIC_KEY.to_string(), Value::String(topic.to_string()));
    }
}

/// A missing or non-string topic entry reads as the default topic.
pub(crate) fn topic_in(vars: &Vars) -> &str {
    vars.get(TOPIC_KEY).and_then(Value::as_str).unwrap_or(DEFAULT_TOPIC)
}

impl Engine {
    pub fn botvars(&self) -> &Vars {
        &self.botvars
    }

    pub fn botvars_mut(&mut self) -> &mut Vars {
        &mut self.botvars
    }

    /// The variables of `user`, if the engine has seen that user.
    pub fn uservars(&self, user: &str) -> Option<&Vars> {
        self.users.get(user).map(|state| &state.vars)
    }

    /// The variables of `user`, creating them on first contact.
    pub fn uservars_mut(&mut self, user: &str) -> &mut Vars {
        &mut self.user_state(user).vars
    }

    pub fn topic_of(&self, user: &str) -> Option<&str> {
        self.users.get(user).map(UserState::topic)
    }

    /// Move `user` to `topic`. An unknown topic is accepted here and falls
    /// back to the default on the user's next message.
    pub fn set_topic(&mut self, user: &str, topic: &str) {
        self.user_state(user).set_topic(topic);
    }

    /// Forget everything about `user`. Returns whether the user was known.
    pub fn reset_user(&mut self, user: &str) -> bool {
        self.users.remove(user).is_some()
    }

    pub fn reset_users(&mut self) {
        self.users.clear();
    }

    pub(crate) fn user_state(&mut self, user: &str) -> &mut UserState {
        self.users.entry(user.to_string()).or_insert_with(UserState::new)
    }

    /// Make sure `user` has a store and sits in an existing topic.
    pub(crate) fn set_user(&mut self, user: &str) {
        let stale = {
            let exists = |topic: &str| self.topics.contains_key(topic);
            let state = self.users.entry(user.to_string()).or_insert_with(UserState::new);
            let topic = state.topic().to_string();
            if exists(&topic) {
                None
            } else {
                state.set_topic(DEFAULT_TOPIC);
                Some(topic)
            }
        };

        if let Some(topic) = stale {
            self.warn(format!("User {user} is in empty topic {topic}, returning to '{DEFAULT_TOPIC}'"));
        }
    }
}
