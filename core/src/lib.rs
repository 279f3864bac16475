//! swipekeys-core
//!
//! Gesture-to-word pipeline for swipe keyboards with a handful of large keys:
//! swipe geometry, key sequencing (single-stroke, two-stroke and
//! master/detail), a frequency-ranked prediction trie, and a manager that
//! switches between prediction engines behind a bounded suggestion cache.
//!
//! Public API:
//! - `SwipeVector`, `SectorTable` - Swipe classification into key indices
//! - `InputSequencer` - Key sequence state machine for every input mode
//! - `PredictionTrie` - Key sequence → ranked words
//! - `PredictionEngineManager` - Engine registry, cache and metrics
//! - `KeyboardSession` - Layout, sequencer and manager wired together
//! - `Config` - Configuration loaded from TOML
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod error;
pub use error::PredictionError;

pub mod geometry;
pub use geometry::{direction, Direction, SectorLayout, SectorTable, SwipeVector};

pub mod layout;
pub use layout::{ControlAction, KeyLetterGrouping, KeyboardLayoutDescriptor, MsrKey};

pub mod sequencer;
pub use sequencer::{InputMode, InputSequencer, MsrState, SequencerEvent};

pub mod candidate;
pub use candidate::Candidate;

pub mod trie;
pub use trie::{PredictionTrie, TrieNode};

pub mod metrics;
pub use metrics::{EngineMetrics, MetricsSnapshot};

pub mod cache;
pub use cache::{BulkEvictionCache, CachePolicy, LruSuggestionCache, SuggestionCache};

pub mod engine;
pub use engine::{PredictionEngine, TrieEngine};

pub mod lexicon;
pub use lexicon::LexiconEngine;

pub mod manager;
pub use manager::{
    ImportReport, MemoryPreferences, PredictionEngineManager, PreferenceStore, SuggestionSlot,
    SuggestionUpdate,
};

pub mod session;
pub use session::KeyboardSession;

/// A word seeded into the dictionary from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomWord {
    pub word: String,
    #[serde(default = "default_word_frequency")]
    pub frequency: u32,
}

fn default_word_frequency() -> u32 {
    1
}

/// Configuration for a keyboard session.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Layout name: a built-in (`four`, `six`, `eight`, `two-stroke`, `msr`)
    /// or the name of an entry in `custom_layouts`.
    pub layout: String,

    /// Preferred prediction engine id (`trie` or `lexicon`).
    pub engine: String,

    /// Prebuilt FST word map for the lexicon engine.
    pub lexicon_path: Option<PathBuf>,

    // Cache Management
    /// Maximum number of entries in the key sequence -> suggestions cache
    pub max_cache_size: usize,
    /// Entries dropped at once when the bulk cache is full
    pub cache_evict_batch: usize,
    pub cache_policy: CachePolicy,

    /// Suggestions shown per query
    pub suggestion_limit: usize,

    /// Bump a committed word's frequency so it ranks higher next time
    pub learn_on_commit: bool,

    pub custom_layouts: Vec<KeyboardLayoutDescriptor>,
    pub custom_words: Vec<CustomWord>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            layout: "four".to_string(),
            engine: TrieEngine::ID.to_string(),
            lexicon_path: None,
            max_cache_size: BulkEvictionCache::DEFAULT_MAX_ENTRIES,
            cache_evict_batch: BulkEvictionCache::DEFAULT_EVICT_BATCH,
            cache_policy: CachePolicy::Bulk,
            suggestion_limit: 8,
            learn_on_commit: true,
            custom_layouts: Vec::new(),
            custom_words: Vec::new(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).context("serialize config")?;
        std::fs::write(path, content).with_context(|| format!("write config {}", path.display()))?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Find the layout named by `layout`. Custom layouts shadow built-ins.
    pub fn resolve_layout(&self) -> anyhow::Result<KeyboardLayoutDescriptor> {
        self.find_layout(&self.layout)
    }

    pub fn find_layout(&self, name: &str) -> anyhow::Result<KeyboardLayoutDescriptor> {
        if let Some(custom) = self.custom_layouts.iter().find(|l| l.name == name) {
            return Ok(custom.clone());
        }
        KeyboardLayoutDescriptor::builtin(name).with_context(|| {
            format!(
                "unknown layout '{}' (built-in: {})",
                name,
                KeyboardLayoutDescriptor::builtin_names().join(", ")
            )
        })
    }
}
