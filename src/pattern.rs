//! Pattern grammar.
//!
//! Rules are written in a small wildcard/alternation grammar instead of raw
//! regular expressions. The engine only talks to the grammar through
//! [`PatternGrammar`], so a different grammar can be plugged in with
//! [`Engine::with_grammar`](crate::Engine::with_grammar) as long as it produces a
//! [`PatternAst`].
//!
//! The bundled [`PatternParser`] understands:
//!
//! ```text
//! hello world      literal words (lower-case letters and digits)
//! *                one or more words            -> capture group
//! _                exactly one word             -> capture group
//! (yes|of course)  alternation                  -> capture group
//! [please]         optional sequence
//! %a:colors        named alternate of the topic -> capture group
//! ```
//!
//! Capture groups are named `match0`, `match1`, ... in the order their opening
//! position appears in the pattern; the engine turns them into the positional
//! match state handed to handlers.

#[path = "pattern/ast.rs"]
mod ast;
#[path = "pattern/parser.rs"]
mod parser;
#[path = "pattern/render.rs"]
mod render;

pub use ast::{PatternAst, PatternNode};
pub use parser::PatternParser;

use crate::PatternError;
use std::collections::HashMap;

/// Named pattern fragments available to `%a:name` references.
pub type Alternates = HashMap<String, String>;

/// Prefix of the named capture groups produced by [`PatternGrammar::render`].
pub const GROUP_PREFIX: &str = "match";

pub trait PatternGrammar: Send + Sync {
    /// Parse pattern text into an AST.
    fn parse(&self, text: &str) -> Result<PatternAst, PatternError>;

    /// Canonical text of a parsed pattern. Two patterns with equal formatting
    /// are the same rule identity.
    fn format(&self, ast: &PatternAst) -> String;

    /// Priority component that grows with the number of literal words.
    fn score(&self, ast: &PatternAst) -> u32;

    /// Regex body (unanchored) for the pattern.
    fn render(&self, ast: &PatternAst, alternates: &Alternates) -> Result<String, PatternError>;
}

impl PatternGrammar for PatternParser {
    fn parse(&self, text: &str) -> Result<PatternAst, PatternError> {
        parser::parse(text)
    }

    fn format(&self, ast: &PatternAst) -> String {
        ast.to_string()
    }

    fn score(&self, ast: &PatternAst) -> u32 {
        ast::score_sequence(ast.nodes())
    }

    fn render(&self, ast: &PatternAst, alternates: &Alternates) -> Result<String, PatternError> {
        render::Renderer::new(alternates).render(ast)
    }
}
