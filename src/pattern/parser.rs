//! Recursive-descent parser for the pattern grammar.

use super::ast::{PatternAst, PatternNode};
use crate::PatternError;

/// The bundled pattern grammar. Stateless; see the [module docs](crate::pattern).
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternParser;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tok {
    Word(String),
    Star,
    Underscore,
    Open,
    Close,
    Pipe,
    OpenOptional,
    CloseOptional,
    Alternate(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closer {
    End,
    Alternation,
    Optional,
}

pub(crate) fn parse(text: &str) -> Result<PatternAst, PatternError> {
    let tokens = lex(text)?;
    let mut parser = Parser { text, tokens, pos: 0 };
    let nodes = parser.sequence(Closer::End)?;
    Ok(PatternAst::new(nodes))
}

fn syntax(text: &str, position: usize, message: impl Into<String>) -> PatternError {
    PatternError::Syntax { pattern: text.to_string(), position, message: message.into() }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() && !c.is_uppercase()
}

fn lex(text: &str) -> Result<Vec<(usize, Tok)>, PatternError> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(at, c)) = chars.peek() {
        let tok = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '*' => Tok::Star,
            '_' => Tok::Underscore,
            '(' => Tok::Open,
            ')' => Tok::Close,
            '|' => Tok::Pipe,
            '[' => Tok::OpenOptional,
            ']' => Tok::CloseOptional,
            '%' => {
                let mut end = at;
                while let Some(&(i, c)) = chars.peek() {
                    if c.is_whitespace() || "()[]|".contains(c) {
                        break;
                    }
                    end = i + c.len_utf8();
                    chars.next();
                }
                let reference = &text[at..end];
                let caps = regex!(r"^%a:([a-z][a-z0-9_]*)$")
                    .captures(reference)
                    .ok_or_else(|| syntax(text, at, format!("malformed alternate reference \"{reference}\"")))?;
                tokens.push((at, Tok::Alternate(caps[1].to_string())));
                continue;
            }
            c if is_word_char(c) => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !is_word_char(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push((at, Tok::Word(word)));
                continue;
            }
            c if c.is_uppercase() => return Err(syntax(text, at, "patterns must be lower case")),
            c => return Err(syntax(text, at, format!("unexpected character '{c}'"))),
        };
        chars.next();
        tokens.push((at, tok));
    }

    Ok(tokens)
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<(usize, Tok)>,
    pos: usize,
}

impl Parser<'_> {
    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|(at, _)| *at).unwrap_or(self.text.len())
    }

    fn error(&self, message: impl Into<String>) -> PatternError {
        syntax(self.text, self.offset(), message)
    }

    /// Parse elements until the token that closes `closer`. The closing token
    /// itself is left for the caller.
    fn sequence(&mut self, closer: Closer) -> Result<Vec<PatternNode>, PatternError> {
        let start = self.offset();
        let mut nodes = Vec::new();

        loop {
            let tok = self.tokens.get(self.pos).map(|(_, t)| t.clone());
            let node = match tok {
                None => {
                    if closer != Closer::End {
                        return Err(self.error("unexpected end of pattern"));
                    }
                    break;
                }
                Some(Tok::Pipe | Tok::Close) if closer == Closer::Alternation => break,
                Some(Tok::CloseOptional) if closer == Closer::Optional => break,
                Some(Tok::Pipe | Tok::Close | Tok::CloseOptional) => {
                    return Err(self.error("unbalanced bracket or stray '|'"));
                }
                Some(Tok::Word(w)) => {
                    self.pos += 1;
                    PatternNode::Word(w)
                }
                Some(Tok::Star) => {
                    self.pos += 1;
                    PatternNode::Star
                }
                Some(Tok::Underscore) => {
                    self.pos += 1;
                    PatternNode::Underscore
                }
                Some(Tok::Alternate(name)) => {
                    self.pos += 1;
                    PatternNode::Alternate(name)
                }
                Some(Tok::Open) => {
                    self.pos += 1;
                    self.alternation()?
                }
                Some(Tok::OpenOptional) => {
                    self.pos += 1;
                    let inner = self.sequence(Closer::Optional)?;
                    self.pos += 1;
                    PatternNode::Optional(inner)
                }
            };
            nodes.push(node);
        }

        if nodes.is_empty() {
            return Err(syntax(self.text, start, "empty pattern or branch"));
        }
        if nodes.iter().all(|n| matches!(n, PatternNode::Optional(_))) {
            return Err(syntax(self.text, start, "a sequence needs at least one required element"));
        }
        Ok(nodes)
    }

    fn alternation(&mut self) -> Result<PatternNode, PatternError> {
        let mut branches = vec![self.sequence(Closer::Alternation)?];
        while let Some((_, Tok::Pipe)) = self.tokens.get(self.pos) {
            self.pos += 1;
            branches.push(self.sequence(Closer::Alternation)?);
        }
        // sequence() only stops on '|' or ')' here, and the loop consumed every '|'.
        self.pos += 1;
        Ok(PatternNode::Alternation(branches))
    }
}
