use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternNode {
    Word(String),
    /// `*`: one or more words.
    Star,
    /// `_`: exactly one word.
    Underscore,
    /// `(a|b c)`: each branch is a sequence.
    Alternation(Vec<Vec<PatternNode>>),
    /// `[a b]`
    Optional(Vec<PatternNode>),
    /// `%a:name`
    Alternate(String),
}

/// A parsed pattern: a non-empty sequence with at least one required element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternAst {
    nodes: Vec<PatternNode>,
}

impl PatternAst {
    pub(crate) fn new(nodes: Vec<PatternNode>) -> Self {
        PatternAst { nodes }
    }

    pub fn nodes(&self) -> &[PatternNode] {
        &self.nodes
    }
}

pub(crate) fn score_sequence(nodes: &[PatternNode]) -> u32 {
    nodes.iter().map(score_node).sum()
}

fn score_node(node: &PatternNode) -> u32 {
    match node {
        PatternNode::Word(_) | PatternNode::Alternate(_) => 1,
        PatternNode::Alternation(branches) => branches.iter().map(|b| score_sequence(b)).min().unwrap_or(0),
        PatternNode::Star | PatternNode::Underscore | PatternNode::Optional(_) => 0,
    }
}

fn write_sequence(f: &mut fmt::Formatter<'_>, nodes: &[PatternNode]) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{node}")?;
    }
    Ok(())
}

impl fmt::Display for PatternNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternNode::Word(w) => f.write_str(w),
            PatternNode::Star => f.write_str("*"),
            PatternNode::Underscore => f.write_str("_"),
            PatternNode::Alternation(branches) => {
                f.write_str("(")?;
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    write_sequence(f, branch)?;
                }
                f.write_str(")")
            }
            PatternNode::Optional(inner) => {
                f.write_str("[")?;
                write_sequence(f, inner)?;
                f.write_str("]")
            }
            PatternNode::Alternate(name) => write!(f, "%a:{name}"),
        }
    }
}

impl fmt::Display for PatternAst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sequence(f, &self.nodes)
    }
}
