//! Text features: tokenizer, vocabulary and binary bag-of-words encoder

use crate::data::{cell, Row, RowSet, Value};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Smallest vocabulary a caller may request
pub const MIN_VOCAB_SIZE: usize = 100;
/// Largest vocabulary a caller may request
pub const MAX_VOCAB_SIZE: usize = 5000;
/// Vocabulary size when none is configured
pub const DEFAULT_VOCAB_SIZE: usize = 500;

/// Normalized text, split lazily into tokens.
///
/// Lower-cased, with every character other than latin and cyrillic letters,
/// digits and whitespace replaced by a space. Tokens of a single character
/// are dropped. `iter()` can be called any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokens {
    normalized: String,
}

impl Tokens {
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.normalized
            .split_whitespace()
            .filter(|t| t.chars().nth(1).is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

impl<'a> IntoIterator for &'a Tokens {
    type Item = &'a str;
    type IntoIter = Box<dyn Iterator<Item = &'a str> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_lowercase()
        || c.is_ascii_digit()
        || ('а'..='я').contains(&c)
        || c == 'ё'
        || c.is_whitespace()
}

/// Tokenize a piece of text. Used for both vocabulary building and encoding.
pub fn tokenize(text: &str) -> Tokens {
    let normalized = text
        .to_lowercase()
        .chars()
        .map(|c| if is_token_char(c) { c } else { ' ' })
        .collect();
    Tokens { normalized }
}

/// Tokenize a cell; nulls tokenize as empty text
pub fn tokenize_value(value: &Value) -> Tokens {
    tokenize(&value.as_text())
}

/// Clamp a requested vocabulary size into the supported range
pub fn clamp_vocab_size(requested: usize) -> usize {
    requested.clamp(MIN_VOCAB_SIZE, MAX_VOCAB_SIZE)
}

/// Fixed token vocabulary for one text column.
///
/// Serialized as the ordered token list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: HashMap<String, usize>,
}

impl From<Vec<String>> for Vocabulary {
    fn from(tokens: Vec<String>) -> Self {
        Self::from_tokens(tokens)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.tokens
    }
}

impl Vocabulary {
    /// Build from ordered tokens, most frequent first
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { tokens, index }
    }

    /// Count token frequencies over every row of `column` and keep the most
    /// frequent ones.
    ///
    /// `requested` is clamped to [`MIN_VOCAB_SIZE`, `MAX_VOCAB_SIZE`]. Ties
    /// keep the order in which tokens were first seen. A column missing from
    /// the rows gives an empty vocabulary.
    pub fn build(rows: &RowSet, column: &str, requested: usize) -> Self {
        let limit = clamp_vocab_size(requested);

        let mut counts: Vec<(String, usize)> = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for row in rows {
            let tokens = tokenize_value(cell(row, column));
            for token in &tokens {
                match seen.get(token) {
                    Some(&slot) => counts[slot].1 += 1,
                    None => {
                        seen.insert(token.to_string(), counts.len());
                        counts.push((token.to_string(), 1));
                    }
                }
            }
        }

        let distinct = counts.len();
        // sort_by is stable, so equal counts stay in first-seen order
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(limit);

        if distinct > limit {
            debug!(column, distinct, limit, "Vocabulary truncated");
        }

        Self::from_tokens(counts.into_iter().map(|(t, _)| t).collect())
    }

    pub fn size(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn position(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }
}

/// Binary bag-of-words encoder over a fitted vocabulary
#[derive(Debug, Clone)]
pub struct TextEncoder {
    vocabulary: Arc<Vocabulary>,
}

impl TextEncoder {
    pub fn new(vocabulary: Arc<Vocabulary>) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Arc<Vocabulary> {
        &self.vocabulary
    }

    pub fn dim(&self) -> usize {
        self.vocabulary.size()
    }

    /// Presence vector for the text in `column`; unknown tokens are ignored
    pub fn transform(&self, row: &Row, column: &str) -> Vec<f64> {
        let mut out = vec![0.0; self.dim()];
        self.transform_into(row, column, &mut out);
        out
    }

    /// Write the presence vector into `out`, which must be `dim()` wide
    pub fn transform_into(&self, row: &Row, column: &str, out: &mut [f64]) {
        let tokens = tokenize_value(cell(row, column));
        let mut set: HashSet<usize> = HashSet::new();
        for token in &tokens {
            if let Some(i) = self.vocabulary.position(token) {
                if set.insert(i) {
                    out[i] = 1.0;
                }
            }
        }
    }
}
