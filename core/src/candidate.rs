//! Ranked word candidates returned by prediction engines.

use serde::{Deserialize, Serialize};

/// A word together with its dictionary frequency.
///
/// Higher frequencies rank first. Engines return candidates already sorted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub word: String,
    pub frequency: u32,
}

impl Candidate {
    pub fn new<T: Into<String>>(word: T, frequency: u32) -> Self {
        Candidate {
            word: word.into(),
            frequency,
        }
    }

    /// Approximate heap + inline footprint, used for cache accounting.
    pub fn size_bytes(&self) -> usize {
        self.word.len() + std::mem::size_of::<Self>()
    }
}

/// Stable sort by descending frequency; equal frequencies keep their order.
pub fn sort_by_frequency(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| b.frequency.cmp(&a.frequency));
}
