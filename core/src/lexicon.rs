//! Dictionary-backed prediction engine over an FST word map.
//!
//! The lexicon is a read-only `fst::Map` from word to frequency. Key sequences
//! are matched by running a small automaton over the map, so a query visits
//! only the words whose letters fall on the requested keys. That search is
//! much more expensive than a trie walk, which is why this engine asks the
//! manager to cache its results. Words added at runtime live in an in-memory
//! overlay next to the map.
use crate::candidate::{sort_by_frequency, Candidate};
use crate::engine::PredictionEngine;
use crate::error::PredictionError;
use crate::layout::KeyLetterGrouping;
use ahash::AHashMap;
use fst::{Automaton, IntoStreamer, Map, Streamer};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

/// Byte → key lookup derived from a [`KeyLetterGrouping`].
///
/// Only single-byte (ASCII) letters can appear on a key; multi-byte words in
/// the lexicon never match.
#[derive(Debug, Clone)]
struct ByteKeys([Option<usize>; 256]);

impl ByteKeys {
    fn from_grouping(grouping: &KeyLetterGrouping) -> Self {
        let mut table = [None; 256];
        for (byte, slot) in table.iter_mut().enumerate().take(128) {
            *slot = grouping.key_for(byte as u8 as char);
        }
        Self(table)
    }

    fn key(&self, byte: u8) -> Option<usize> {
        self.0[byte as usize]
    }
}

/// Accepts words whose letters map, one by one, onto `keys`.
///
/// With `prefix` set, any continuation after the last key is accepted too.
struct KeySequenceAutomaton<'a> {
    keys: &'a [usize],
    byte_keys: &'a ByteKeys,
    prefix: bool,
}

impl Automaton for KeySequenceAutomaton<'_> {
    // Number of keys matched so far; None once the word left the path.
    type State = Option<usize>;

    fn start(&self) -> Self::State {
        Some(0)
    }

    fn is_match(&self, state: &Self::State) -> bool {
        *state == Some(self.keys.len())
    }

    fn can_match(&self, state: &Self::State) -> bool {
        state.is_some()
    }

    fn accept(&self, state: &Self::State, byte: u8) -> Self::State {
        let matched = (*state)?;
        match self.keys.get(matched) {
            Some(&key) if self.byte_keys.key(byte) == Some(key) => Some(matched + 1),
            Some(_) => None,
            None if self.prefix => Some(matched),
            None => None,
        }
    }
}

#[derive(Debug)]
struct LexiconState {
    lexicon: Option<Map<Vec<u8>>>,
    overlay: AHashMap<String, u32>,
    grouping: KeyLetterGrouping,
    byte_keys: ByteKeys,
}

impl Default for LexiconState {
    fn default() -> Self {
        let grouping = KeyLetterGrouping::default();
        let byte_keys = ByteKeys::from_grouping(&grouping);
        Self {
            lexicon: None,
            overlay: AHashMap::new(),
            grouping,
            byte_keys,
        }
    }
}

impl LexiconState {
    fn search(&self, keys: &[usize], prefix: bool) -> Vec<Candidate> {
        let mut found: Vec<Candidate> = Vec::new();
        if let Some(map) = &self.lexicon {
            let automaton = KeySequenceAutomaton {
                keys,
                byte_keys: &self.byte_keys,
                prefix,
            };
            let mut stream = map.search(automaton).into_stream();
            while let Some((word, frequency)) = stream.next() {
                let Ok(word) = std::str::from_utf8(word) else {
                    continue;
                };
                if self.overlay.contains_key(word) {
                    continue;
                }
                found.push(Candidate::new(word, clamp_frequency(frequency)));
            }
        }
        for (word, &frequency) in &self.overlay {
            let Ok(path) = self.grouping.key_sequence_for(word) else {
                continue;
            };
            let on_path = if prefix {
                path.starts_with(keys)
            } else {
                path == keys
            };
            if on_path {
                found.push(Candidate::new(word.clone(), frequency));
            }
        }
        sort_by_frequency(&mut found);
        found
    }
}

fn clamp_frequency(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Alternative engine answering from a static lexicon plus user words.
///
/// The engine reports itself unavailable until a lexicon is loaded.
#[derive(Debug, Default)]
pub struct LexiconEngine {
    state: RwLock<LexiconState>,
}

impl LexiconEngine {
    pub const ID: &'static str = "lexicon";

    /// An engine with no lexicon loaded (unavailable).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the lexicon from `(word, frequency)` pairs.
    ///
    /// Duplicate words keep the highest frequency.
    pub fn from_words<I, S>(words: I) -> Result<Self, fst::Error>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let engine = Self::new();
        engine.load_words(words)?;
        Ok(engine)
    }

    /// Open a prebuilt FST map (word → frequency) from disk.
    pub fn load_fst<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let mut f = File::open(path).with_context(|| format!("open fst {}", path.display()))?;
        let mut buf = Vec::new();
        f.read_to_end(&mut buf)
            .with_context(|| format!("read fst {}", path.display()))?;
        let map = Map::new(buf).context("parse fst map")?;
        let engine = Self::new();
        engine.write(|state| state.lexicon = Some(map));
        Ok(engine)
    }

    /// Replace the lexicon with `(word, frequency)` pairs.
    ///
    /// Returns the number of distinct words loaded.
    pub fn load_words<I, S>(&self, words: I) -> Result<usize, fst::Error>
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        let mut sorted: BTreeMap<String, u64> = BTreeMap::new();
        for (word, frequency) in words {
            let entry = sorted.entry(word.into()).or_insert(0);
            *entry = (*entry).max(u64::from(frequency));
        }
        let count = sorted.len();
        let map = Map::from_iter(sorted)?;
        self.write(|state| state.lexicon = Some(map));
        debug!(words = count, "lexicon loaded");
        Ok(count)
    }

    /// Serialized FST bytes of the loaded lexicon, if any.
    pub fn fst_bytes(&self) -> Option<Vec<u8>> {
        self.read(|state| state.lexicon.as_ref().map(|m| m.as_fst().as_bytes().to_vec()))
    }

    fn read<R>(&self, f: impl FnOnce(&LexiconState) -> R) -> R {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut LexiconState) -> R) -> R {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }
}

impl PredictionEngine for LexiconEngine {
    fn id(&self) -> &str {
        Self::ID
    }

    fn set_key_letter_grouping(&self, groups: &[String], two_strokes: bool) {
        let grouping = KeyLetterGrouping::new(groups, two_strokes);
        let byte_keys = ByteKeys::from_grouping(&grouping);
        self.write(|state| {
            state.grouping = grouping;
            state.byte_keys = byte_keys;
        });
    }

    /// Adds the word to the user overlay after checking it against the
    /// grouping, exactly like the trie engine.
    fn insert(&self, word: &str, frequency: u32) -> Result<(), PredictionError> {
        if word.is_empty() {
            return Ok(());
        }
        self.write(|state| {
            state.grouping.key_sequence_for(word)?;
            state.overlay.insert(word.to_string(), frequency);
            Ok(())
        })
    }

    fn contains(&self, word: &str) -> bool {
        self.frequency(word).is_some()
    }

    fn frequency(&self, word: &str) -> Option<u32> {
        self.read(|state| {
            state.overlay.get(word).copied().or_else(|| {
                state
                    .lexicon
                    .as_ref()
                    .and_then(|map| map.get(word))
                    .map(clamp_frequency)
            })
        })
    }

    fn suggestions(&self, keys: &[usize]) -> Vec<Candidate> {
        if keys.is_empty() {
            return Vec::new();
        }
        self.read(|state| state.search(keys, false))
    }

    fn completions(&self, keys: &[usize], limit: usize) -> Vec<Candidate> {
        let mut found = self.read(|state| state.search(keys, true));
        found.truncate(limit);
        found
    }

    fn is_available(&self) -> bool {
        self.read(|state| state.lexicon.is_some())
    }

    fn wants_cache(&self) -> bool {
        true
    }

    fn word_count(&self) -> usize {
        self.read(|state| {
            let lexicon = state.lexicon.as_ref().map(|m| m.len()).unwrap_or(0);
            let extra = state
                .overlay
                .keys()
                .filter(|w| !state.lexicon.as_ref().is_some_and(|m| m.contains_key(w)))
                .count();
            lexicon + extra
        })
    }

    /// Drops the user overlay; the static lexicon stays loaded.
    fn clear(&self) {
        self.write(|state| state.overlay.clear());
    }
}
