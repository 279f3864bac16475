// core/src/engine.rs
//
// Prediction engine capability and the trie-backed engine.

use crate::candidate::Candidate;
use crate::error::PredictionError;
use crate::trie::PredictionTrie;
use std::sync::{PoisonError, RwLock};

/// Capability every prediction back-end provides.
///
/// Engines are shared between the interactive thread and background query
/// workers, so all methods take `&self` and implementations use interior
/// mutability.
pub trait PredictionEngine: Send + Sync {
    /// Stable identifier used for selection and persisted preferences.
    fn id(&self) -> &str;

    /// Replace the letter → key table used by `insert` and `suggestions`.
    fn set_key_letter_grouping(&self, groups: &[String], two_strokes: bool);

    /// Add or re-rank a word.
    fn insert(&self, word: &str, frequency: u32) -> Result<(), PredictionError>;

    fn contains(&self, word: &str) -> bool;

    fn frequency(&self, word: &str) -> Option<u32>;

    /// Ranked words whose key path is exactly `keys`. Never fails; an engine
    /// that cannot answer returns an empty list.
    fn suggestions(&self, keys: &[usize]) -> Vec<Candidate>;

    /// Ranked words whose key path starts with `keys`.
    fn completions(&self, keys: &[usize], limit: usize) -> Vec<Candidate> {
        let _ = (keys, limit);
        Vec::new()
    }

    fn is_available(&self) -> bool {
        true
    }

    /// Whether queries are costly enough to be worth caching.
    fn wants_cache(&self) -> bool {
        false
    }

    fn word_count(&self) -> usize;

    /// Drop every word this engine learned.
    fn clear(&self);
}

/// Engine answering from an in-memory [`PredictionTrie`].
///
/// Queries are a walk of the sequence length, so results are not cached.
#[derive(Debug, Default)]
pub struct TrieEngine {
    trie: RwLock<PredictionTrie>,
}

impl TrieEngine {
    pub const ID: &'static str = "trie";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_trie(trie: PredictionTrie) -> Self {
        Self {
            trie: RwLock::new(trie),
        }
    }

    /// Snapshot of every stored word, for persistence by the caller.
    pub fn words(&self) -> Vec<Candidate> {
        self.read(|trie| trie.words().collect())
    }

    // Insertion validates before mutating, so a poisoned trie is still
    // consistent and safe to keep using.
    fn read<R>(&self, f: impl FnOnce(&PredictionTrie) -> R) -> R {
        let guard = self.trie.read().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut PredictionTrie) -> R) -> R {
        let mut guard = self.trie.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }
}

impl PredictionEngine for TrieEngine {
    fn id(&self) -> &str {
        Self::ID
    }

    fn set_key_letter_grouping(&self, groups: &[String], two_strokes: bool) {
        self.write(|trie| trie.set_key_letter_grouping(groups, two_strokes));
    }

    fn insert(&self, word: &str, frequency: u32) -> Result<(), PredictionError> {
        self.write(|trie| trie.insert(word, frequency))
    }

    fn contains(&self, word: &str) -> bool {
        self.read(|trie| trie.contains(word))
    }

    fn frequency(&self, word: &str) -> Option<u32> {
        self.read(|trie| trie.frequency(word))
    }

    fn suggestions(&self, keys: &[usize]) -> Vec<Candidate> {
        self.read(|trie| trie.suggestions(keys))
    }

    fn completions(&self, keys: &[usize], limit: usize) -> Vec<Candidate> {
        self.read(|trie| trie.completions(keys, limit))
    }

    fn word_count(&self) -> usize {
        self.read(|trie| trie.len())
    }

    fn clear(&self) {
        self.write(|trie| trie.clear());
    }
}
