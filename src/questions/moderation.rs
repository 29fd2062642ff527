//! Content moderation for question text.
//!
//! Tokenizes on word boundaries and masks dictionary hits with an
//! equal-length `*` run. Matching is case-sensitive and whole-token only,
//! so embedded substrings ("class") pass through untouched.

use std::collections::HashSet;

const DEFAULT_WORDS: &[&str] = &[
    "arse", "ass", "asshole", "bastard", "bitch", "bollocks", "crap", "cunt", "damn", "dick",
    "fuck", "fucker", "fucking", "piss", "prick", "shit", "shite", "slut", "twat", "wanker",
    "whore",
];

pub struct WordFilter {
    words: HashSet<String>,
}

impl WordFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Filter backed by the built-in English dictionary.
    pub fn default_dictionary() -> Self {
        Self::new(DEFAULT_WORDS.iter().copied())
    }

    /// Replace every dictionary word with a `*` run of the same length.
    pub fn censor(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for token in tokenize(text) {
            if self.words.contains(token) {
                out.extend(std::iter::repeat('*').take(token.chars().count()));
            } else {
                out.push_str(token);
            }
        }
        out
    }
}

impl Default for WordFilter {
    fn default() -> Self {
        Self::default_dictionary()
    }
}

/// Split into alternating word / non-word runs, preserving every character.
fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut prev_is_word = None;
    for (i, c) in text.char_indices() {
        let is_word = is_word_char(c);
        match prev_is_word {
            Some(prev) if prev == is_word => {}
            Some(_) => {
                tokens.push(&text[start..i]);
                start = i;
                prev_is_word = Some(is_word);
            }
            None => prev_is_word = Some(is_word),
        }
    }
    if !text.is_empty() {
        tokens.push(&text[start..]);
    }
    tokens
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
