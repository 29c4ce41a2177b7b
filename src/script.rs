//! Scripts: where rules come from.
//!
//! A [`Script`] declares its rules explicitly through [`Script::declare`];
//! nothing is inferred from method names. A [`ScriptSource`] yields fresh script
//! instances every time the engine loads, so a reload rebuilds the rule set
//! from scratch.
//!
//! Two sources are provided:
//!
//! - [`ScriptRegistry`]: scripts compiled into the program, registered by type
//!   or factory.
//! - [`DirectorySource`]: JSON rule files read from a directory.

#[path = "script/directory.rs"]
mod directory;

pub use directory::DirectorySource;

use crate::{DEFAULT_TOPIC, Handler, ScriptLoadError, Vars};

pub trait Script {
    /// Diagnostic name; rule names are `"{script}.{rule}"`.
    fn name(&self) -> &str;

    /// Topic the script's rules are registered in.
    fn topic(&self) -> &str {
        DEFAULT_TOPIC
    }

    /// Called once per load, before [`declare`](Self::declare), with the
    /// bot-wide variable store.
    fn setup(&mut self, _botvars: &mut Vars) {}

    fn declare(&self) -> Vec<Declaration>;
}

/// A pattern rule as declared by a script.
#[derive(Clone)]
pub struct RuleSpec {
    pub name: String,
    pub pattern: String,
    /// Pattern the previous reply must match; empty for none.
    pub previous: String,
    pub weight: i32,
    pub handler: Handler,
}

impl std::fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSpec")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("previous", &self.previous)
            .field("weight", &self.weight)
            .field("handler", &"<function>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum Declaration {
    Pattern(RuleSpec),
    /// A named alternate. Reported and ignored by the engine; seed alternates
    /// with [`Engine::add_alternate`](crate::Engine::add_alternate) instead.
    Alternate { name: String, value: String },
    /// A word substitution. Reported and ignored by the engine; seed
    /// substitutions through [`Config`](crate::Config) instead.
    Substitute { word: String, replacement: String },
}

pub trait ScriptSource {
    fn describe(&self) -> String;

    /// Fresh script instances, one entry per script. Failures are per script.
    fn scripts(&self) -> Vec<Result<Box<dyn Script>, ScriptLoadError>>;
}

pub type ScriptFactory = Box<dyn Fn() -> Result<Box<dyn Script>, ScriptLoadError> + Send + Sync>;

/// Scripts compiled into the program.
#[derive(Default)]
pub struct ScriptRegistry {
    factories: Vec<ScriptFactory>,
}

impl std::fmt::Debug for ScriptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRegistry").field("scripts", &self.factories.len()).finish()
    }
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a script type; a new instance is created on every load.
    pub fn register<S: Script + Default + 'static>(&mut self) -> &mut Self {
        self.factories.push(Box::new(|| Ok(Box::new(S::default()) as Box<dyn Script>)));
        self
    }

    /// Register a factory that may fail to produce its script.
    pub fn register_with<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn() -> Result<Box<dyn Script>, ScriptLoadError> + Send + Sync + 'static,
    {
        self.factories.push(Box::new(factory));
        self
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl ScriptSource for ScriptRegistry {
    fn describe(&self) -> String {
        format!("script registry ({} scripts)", self.factories.len())
    }

    fn scripts(&self) -> Vec<Result<Box<dyn Script>, ScriptLoadError>> {
        self.factories.iter().map(|factory| factory()).collect()
    }
}
