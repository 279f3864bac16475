//! Error types surfaced by dictionary insertion.

use thiserror::Error;

/// Errors returned by prediction engines.
///
/// Only insertion is fallible; lookups, sequencing and caching are total and
/// degrade to empty results instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    /// A character of `word` has no key under the active letter grouping.
    ///
    /// Insertion is all-or-nothing, so the dictionary is unchanged when this
    /// is returned.
    #[error("unsupported word {word:?}: character {ch:?} is not on any key")]
    UnsupportedWord { word: String, ch: char },
}

impl PredictionError {
    /// The first character that could not be mapped to a key.
    pub fn offending_char(&self) -> char {
        match self {
            PredictionError::UnsupportedWord { ch, .. } => *ch,
        }
    }
}
