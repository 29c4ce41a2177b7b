//! Log sinks.
//!
//! Two independent sinks, each switchable in [`Config`](crate::Config): debug
//! messages, which additionally need the `debug` bot variable to be `"True"`,
//! and warnings/errors, which are always emitted while their sink is on.

use super::Engine;
use crate::{DEBUG_KEY, Value};
use std::fmt::Display;

impl Engine {
    pub(crate) fn debug_enabled(&self) -> bool {
        self.config.debug_log && self.botvars.get(DEBUG_KEY).and_then(Value::as_str) == Some("True")
    }

    pub(crate) fn say(&self, message: impl Display) {
        if self.debug_enabled() {
            tracing::debug!(target: "charge", "{message}");
        }
    }

    pub(crate) fn warn(&self, message: impl Display) {
        if self.config.error_log {
            tracing::warn!(target: "charge", "{message}");
        }
    }

    pub(crate) fn error(&self, message: impl Display) {
        if self.config.error_log {
            tracing::error!(target: "charge", "{message}");
        }
    }
}
