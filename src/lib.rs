//! Rule-based chatbot reply engine.
//!
//! Scripts declare pattern rules; the [`Engine`] groups them into topics,
//! compiles each pattern to an anchored regex and answers a message with the
//! handler of the highest-priority rule whose pattern matches the normalized
//! input. Handlers can read and write per-user and bot-wide variables and can
//! ask the engine for further replies, up to a configured nesting depth.
//!
//! ```
//! use charge::{Config, Engine, Script, ScriptRegistry, Declaration, rule};
//!
//! #[derive(Default)]
//! struct Greeter;
//!
//! impl Script for Greeter {
//!     fn name(&self) -> &str {
//!         "greeter"
//!     }
//!
//!     fn declare(&self) -> Vec<Declaration> {
//!         vec![rule! {
//!             name: "hello",
//!             pattern: "hello *",
//!             reply: |turn| { Ok(format!("Hello to you, {}!", turn.group(0).unwrap_or("stranger"))) }
//!         }]
//!     }
//! }
//!
//! let mut registry = ScriptRegistry::new();
//! registry.register::<Greeter>();
//!
//! let mut engine = Engine::new(Config::default().quiet());
//! engine.load_scripts(&registry);
//! assert_eq!(engine.reply("alice", "Hello, Bob!"), "Hello to you, bob!");
//! ```

#[macro_use]
mod macros;
mod config;
mod engine;
mod error;
pub mod pattern;
mod script;
mod target;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub use config::{Config, DEFAULT_DEPTH_LIMIT};
pub use engine::{Engine, LoadReport, Outcome, ReplyDetails, Rule, RuleSummary, Topic, Turn};
pub use error::{HandlerError, LoadIssue, PatternError, PatternField, RuleError, ScriptLoadError};
pub use pattern::{Alternates, PatternAst, PatternGrammar, PatternParser};
pub use script::{Declaration, DirectorySource, RuleSpec, Script, ScriptRegistry, ScriptSource};
pub use serde_json::Value;
pub use target::Target;

/// Topic every user starts in, and the one whose rules are matched.
pub const DEFAULT_TOPIC: &str = "all";

/// Reserved user variable holding the user's current topic name.
pub const TOPIC_KEY: &str = "__topic__";

/// Bot variable consulted by the debug log sink; debug output is on when it is `"True"`.
pub const DEBUG_KEY: &str = "debug";

/// Identifier of a conversation partner, as passed to [`Engine::reply`].
pub type UserId = String;

/// A variable store: bot-wide or per user.
pub type Vars = HashMap<String, Value>;

/// Capture groups of the current match, keyed by their position in the pattern.
pub type Matches = BTreeMap<usize, String>;

/// Reply handler attached to a rule. Identity (for duplicate detection) is the
/// identity of the shared callable.
pub type Handler = Arc<dyn Fn(&mut Turn<'_>) -> Result<String, HandlerError> + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&mut Turn<'_>) -> Result<String, HandlerError> + Send + Sync + 'static,
{
    Arc::new(f)
}
