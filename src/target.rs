//! Input normalization.
//!
//! A [`Target`] is the form of a user message that patterns are matched
//! against. The message is split on whitespace, each word is lower-cased and
//! run through the substitution table (which may expand it into several
//! words), and finally every character that is not a letter or digit is
//! dropped.
//!
//! ```text
//! "I'm tired today!"   ──▶ [["i", "am"], ["tired"], ["today"]]  ──▶ "i am tired today"
//! "Bob's cat."         ──▶ [["bobs"], ["cat"]]                 ──▶ "bobs cat"
//! "Wazzup! :)"         ──▶ [["wazzup"], [""]]                  ──▶ "wazzup "
//! ```
//!
//! Tokens that end up empty are kept, so the joined form carries an extra
//! separator for each of them. Pattern regexes are rendered against exactly
//! this layout.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub orig_text: String,
    pub orig_words: Vec<String>,
    /// One group per original word, holding the words it became after substitution.
    pub tokenized_words: Vec<Vec<String>>,
    pub normalized: String,
}

impl Target {
    pub fn new(text: &str, substitutions: &HashMap<String, String>) -> Self {
        let orig_words: Vec<String> = text.split_whitespace().map(str::to_string).collect();

        let tokenized_words: Vec<Vec<String>> = orig_words
            .iter()
            .map(|word| substitute(&word.to_lowercase(), substitutions).into_iter().map(alphanumeric).collect())
            .collect();

        let normalized = tokenized_words.iter().map(|group| group.join(" ")).collect::<Vec<_>>().join(" ");

        Target { orig_text: text.to_string(), orig_words, tokenized_words, normalized }
    }
}

/// Exact whole-word lookup; a hit may expand to zero or more words.
fn substitute(word: &str, substitutions: &HashMap<String, String>) -> Vec<String> {
    match substitutions.get(word) {
        Some(replacement) => replacement.split_whitespace().map(str::to_string).collect(),
        None => vec![word.to_string()],
    }
}

fn alphanumeric(word: String) -> String {
    word.chars().filter(|c| c.is_alphanumeric()).collect()
}
