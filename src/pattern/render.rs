//! Regex rendering.
//!
//! Words in a normalized target are separated by single spaces, so a sequence
//! renders as its elements joined by `' '`. Optional parts carry their own
//! separator so that leaving them out does not leave a stray space behind:
//!
//! ```text
//! [please] help me      ->  (?:please )?help me
//! thank you [very much] ->  thank you(?: very much)?
//! ```

use super::ast::{PatternAst, PatternNode};
use super::parser::parse;
use super::{Alternates, GROUP_PREFIX};
use crate::PatternError;

pub(crate) struct Renderer<'a> {
    alternates: &'a Alternates,
    next_group: usize,
    /// Alternates currently being expanded, innermost last.
    expanding: Vec<String>,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(alternates: &'a Alternates) -> Self {
        Renderer { alternates, next_group: 0, expanding: Vec::new() }
    }

    pub(crate) fn render(mut self, ast: &PatternAst) -> Result<String, PatternError> {
        self.sequence(ast.nodes(), true)
    }

    fn sequence(&mut self, nodes: &[PatternNode], capture: bool) -> Result<String, PatternError> {
        let mut out = String::new();
        let mut started = false;

        for node in nodes {
            if let PatternNode::Optional(inner) = node {
                let body = self.sequence(inner, capture)?;
                if started {
                    out.push_str(&format!("(?: {body})?"));
                } else {
                    out.push_str(&format!("(?:{body} )?"));
                }
                continue;
            }
            if started {
                out.push(' ');
            }
            out.push_str(&self.node(node, capture)?);
            started = true;
        }

        Ok(out)
    }

    fn node(&mut self, node: &PatternNode, capture: bool) -> Result<String, PatternError> {
        match node {
            PatternNode::Word(w) => Ok(regex::escape(w)),
            PatternNode::Star => self.group(capture, |_| Ok(".+?".to_string())),
            PatternNode::Underscore => self.group(capture, |_| Ok("[^ ]+".to_string())),
            PatternNode::Alternation(branches) => self.group(capture, |r| {
                let rendered = branches.iter().map(|b| r.sequence(b, capture)).collect::<Result<Vec<_>, _>>()?;
                Ok(rendered.join("|"))
            }),
            PatternNode::Alternate(name) => {
                let fragment =
                    self.alternates.get(name).ok_or_else(|| PatternError::UnknownAlternate(name.clone()))?;
                if self.expanding.contains(name) {
                    return Err(PatternError::BadAlternate {
                        name: name.clone(),
                        message: "recursive alternate".to_string(),
                    });
                }
                let ast = parse(fragment)
                    .map_err(|e| PatternError::BadAlternate { name: name.clone(), message: e.to_string() })?;
                self.expanding.push(name.clone());
                let rendered = self.group(capture, |r| r.sequence(ast.nodes(), false));
                self.expanding.pop();
                rendered
            }
            PatternNode::Optional(inner) => {
                let body = self.sequence(inner, capture)?;
                Ok(format!("(?:{body})?"))
            }
        }
    }

    /// Wrap `inner` in a capture group, allocating its number before rendering
    /// the contents so nested groups number after their parent.
    fn group(
        &mut self,
        capture: bool,
        inner: impl FnOnce(&mut Self) -> Result<String, PatternError>,
    ) -> Result<String, PatternError> {
        if !capture {
            return Ok(format!("(?:{})", inner(self)?));
        }
        let index = self.next_group;
        self.next_group += 1;
        Ok(format!("(?P<{GROUP_PREFIX}{index}>{})", inner(self)?))
    }
}
