//! Engine configuration.
//!
//! Defaults match an interactive bot: debug output off, a recursion limit of 50
//! nested replies and both log sinks enabled. `CHARGE_DEBUG` and `CHARGE_DEPTH`
//! override the defaults when read through [`Config::from_env`].

use std::collections::HashMap;

pub const DEFAULT_DEPTH_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct Config {
    /// Initial value of the `debug` bot variable.
    pub debug: bool,
    /// Nesting limit for replies that reference other replies.
    pub depth_limit: usize,
    /// Enables the debug sink. Debug output additionally requires the `debug` bot variable to be `"True"`.
    pub debug_log: bool,
    /// Enables the warning/error sink.
    pub error_log: bool,
    /// Word substitutions applied while normalizing input, keyed by lower-cased word.
    pub substitutions: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            depth_limit: DEFAULT_DEPTH_LIMIT,
            debug_log: true,
            error_log: true,
            substitutions: HashMap::new(),
        }
    }
}

impl Config {
    /// Defaults, overridden by `CHARGE_DEBUG` (`1`/`true`) and `CHARGE_DEPTH` (a number).
    ///
    /// Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Some(value) = std::env::var_os("CHARGE_DEBUG") {
            let value = value.to_string_lossy().to_ascii_lowercase();
            config.debug = value == "1" || value == "true";
        }
        if let Some(depth) = std::env::var("CHARGE_DEPTH").ok().and_then(|v| v.trim().parse().ok()) {
            config.depth_limit = depth;
        }
        config
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_depth_limit(mut self, depth_limit: usize) -> Self {
        self.depth_limit = depth_limit;
        self
    }

    /// Disable both log sinks.
    pub fn quiet(mut self) -> Self {
        self.debug_log = false;
        self.error_log = false;
        self
    }

    pub fn with_substitution(mut self, word: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.substitutions.insert(word.into().to_lowercase(), replacement.into());
        self
    }
}
