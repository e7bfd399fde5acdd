//! Word lists for the drawing game.
//!
//! Words load from a UTF-8 file with one word per line; blank lines and
//! `#` comments are skipped. An unreadable or empty file falls back to a
//! small built-in list so a server always has something to play with.

use std::path::Path;

use rand::seq::IndexedRandom;

/// Fallback vocabulary used when no usable word file is available.
const BUILTIN_WORDS: &[&str] = &[
    "apple", "house", "cat", "sun", "tree", "fish", "car", "star", "dog",
    "moon", "boat", "clock", "bridge", "guitar", "rocket", "spider",
    "pizza", "robot", "candle", "mountain",
];

/// An immutable, non-empty pool of secret words.
#[derive(Debug, Clone)]
pub struct WordList {
    words: Vec<String>,
}

impl WordList {
    /// The built-in fallback list.
    pub fn builtin() -> Self {
        Self {
            words: BUILTIN_WORDS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Builds a list from explicit words, falling back to the built-in
    /// list when `words` is empty.
    pub fn from_words(words: Vec<String>) -> Self {
        if words.is_empty() {
            Self::builtin()
        } else {
            Self { words }
        }
    }

    /// Loads a word file. Falls back to the built-in list if the file is
    /// unreadable or contains no usable words.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let words = parse_words(&text);
                if words.is_empty() {
                    tracing::warn!(
                        path = %path.display(),
                        "word file has no usable words, using built-in list"
                    );
                    Self::builtin()
                } else {
                    tracing::info!(
                        path = %path.display(),
                        count = words.len(),
                        "loaded word list"
                    );
                    Self { words }
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "cannot read word file, using built-in list"
                );
                Self::builtin()
            }
        }
    }

    /// Picks one word uniformly at random.
    pub fn pick(&self) -> &str {
        self.words
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or(BUILTIN_WORDS[0])
    }

    /// Number of words in the pool.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always `false` — constructors guarantee a non-empty pool.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn parse_words(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
