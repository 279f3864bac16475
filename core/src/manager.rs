//! Prediction engine registry, selection, caching and background queries.
//!
//! The manager is an ordinary value owned by the session that uses it; tests
//! and front-ends construct their own. It keeps a set of interchangeable
//! [`PredictionEngine`]s, exactly one of which is current, and puts a bounded
//! [`SuggestionCache`] in front of engines that ask for it.
use crate::cache::{new_cache, sequence_key, SuggestionCache};
use crate::candidate::Candidate;
use crate::engine::PredictionEngine;
use crate::error::PredictionError;
use crate::metrics::{EngineMetrics, MetricsSnapshot};
use crate::Config;
use ahash::AHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, warn};

/// Where the chosen engine id is remembered between sessions.
pub trait PreferenceStore: Send + Sync {
    fn load_engine_id(&self) -> Option<String>;
    fn save_engine_id(&self, id: &str);
}

/// Preference store that keeps values in memory only.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    engine_id: RwLock<Option<String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine_id(id: &str) -> Self {
        Self {
            engine_id: RwLock::new(Some(id.to_string())),
        }
    }
}

impl PreferenceStore for MemoryPreferences {
    fn load_engine_id(&self) -> Option<String> {
        self.engine_id.read().ok().and_then(|id| id.clone())
    }

    fn save_engine_id(&self, id: &str) {
        if let Ok(mut slot) = self.engine_id.write() {
            *slot = Some(id.to_string());
        }
    }
}

/// A suggestion list tagged with the query ticket that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionUpdate {
    pub ticket: u64,
    pub keys: Vec<usize>,
    pub suggestions: Vec<Candidate>,
}

/// Holds the result of the most recently issued background query.
///
/// Every query takes a ticket from a monotonically increasing counter. A
/// result is applied only if its ticket is still the newest one issued, so a
/// late answer for an older key sequence can never replace newer suggestions.
#[derive(Debug, Default)]
pub struct SuggestionSlot {
    issued: AtomicU64,
    latest: Mutex<SuggestionUpdate>,
}

impl SuggestionSlot {
    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Supersede every in-flight query.
    pub fn invalidate(&self) {
        self.issue();
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.issued.load(Ordering::SeqCst) == ticket
    }

    /// Apply `update` if it answers the newest query. Returns whether it was
    /// applied.
    pub fn offer(&self, update: SuggestionUpdate) -> bool {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.is_current(update.ticket) || update.ticket <= latest.ticket {
            debug!(ticket = update.ticket, "discarding superseded suggestions");
            return false;
        }
        *latest = update;
        true
    }

    pub fn latest(&self) -> SuggestionUpdate {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Outcome of a bulk word import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: usize,
    pub rejected: Vec<PredictionError>,
}

/// Registry of interchangeable prediction engines with a shared cache.
pub struct PredictionEngineManager {
    engines: RwLock<AHashMap<String, Arc<dyn PredictionEngine>>>,
    current: RwLock<Option<String>>,
    cache: Arc<dyn SuggestionCache>,
    metrics: EngineMetrics,
    preferences: Arc<dyn PreferenceStore>,
    slot: SuggestionSlot,
}

impl std::fmt::Debug for PredictionEngineManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionEngineManager")
            .field("engines", &self.engine_ids())
            .field("current", &self.current_engine_id())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl PredictionEngineManager {
    pub fn new(cache: Arc<dyn SuggestionCache>, preferences: Arc<dyn PreferenceStore>) -> Self {
        Self {
            engines: RwLock::new(AHashMap::new()),
            current: RwLock::new(None),
            cache,
            metrics: EngineMetrics::new(),
            preferences,
            slot: SuggestionSlot::default(),
        }
    }

    /// Manager with the cache described by `config`.
    pub fn from_config(config: &Config, preferences: Arc<dyn PreferenceStore>) -> Self {
        let cache = new_cache(
            config.cache_policy,
            config.max_cache_size,
            config.cache_evict_batch,
        );
        Self::new(cache, preferences)
    }

    /// Add an engine. The first engine registered becomes current.
    pub fn register(&self, engine: Arc<dyn PredictionEngine>) {
        let id = engine.id().to_string();
        if let Ok(mut engines) = self.engines.write() {
            engines.insert(id.clone(), engine);
        }
        if let Ok(mut current) = self.current.write() {
            if current.is_none() {
                *current = Some(id);
            }
        }
    }

    pub fn engine_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .engines
            .read()
            .map(|e| e.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn engine(&self, id: &str) -> Option<Arc<dyn PredictionEngine>> {
        self.engines.read().ok()?.get(id).cloned()
    }

    pub fn current_engine_id(&self) -> Option<String> {
        self.current.read().ok()?.clone()
    }

    pub fn current_engine(&self) -> Option<Arc<dyn PredictionEngine>> {
        let id = self.current_engine_id()?;
        self.engine(&id)
    }

    /// Make `id` the current engine if it is registered and available.
    ///
    /// On success the choice is saved to the preference store. Dictionary
    /// state is not transferred, and the caller must apply the grouping to
    /// the new engine.
    pub fn switch_to_engine(&self, id: &str) -> bool {
        let Some(engine) = self.engine(id) else {
            warn!(engine = id, "unknown prediction engine");
            return false;
        };
        if !engine.is_available() {
            warn!(engine = id, "prediction engine unavailable");
            return false;
        }
        let Ok(mut current) = self.current.write() else {
            return false;
        };
        *current = Some(id.to_string());
        drop(current);
        self.preferences.save_engine_id(id);
        self.invalidate();
        debug!(engine = id, "switched prediction engine");
        true
    }

    /// Switch to the engine remembered by the preference store, if possible.
    pub fn restore_preferred_engine(&self) -> bool {
        match self.preferences.load_engine_id() {
            Some(id) => self.switch_to_engine(&id),
            None => false,
        }
    }

    /// Apply a grouping to the current engine and drop cached results.
    pub fn set_key_letter_grouping(&self, groups: &[String], two_strokes: bool) {
        if let Some(engine) = self.current_engine() {
            engine.set_key_letter_grouping(groups, two_strokes);
        }
        self.invalidate();
    }

    /// Insert into the current engine. With no engine this is a no-op.
    pub fn insert(&self, word: &str, frequency: u32) -> Result<(), PredictionError> {
        let Some(engine) = self.current_engine() else {
            return Ok(());
        };
        engine.insert(word, frequency)?;
        self.invalidate();
        Ok(())
    }

    /// Insert many words, collecting rejections instead of stopping.
    pub fn import_words<I, S>(&self, words: I) -> ImportReport
    where
        I: IntoIterator<Item = (S, u32)>,
        S: AsRef<str>,
    {
        let mut report = ImportReport::default();
        let Some(engine) = self.current_engine() else {
            return report;
        };
        for (word, frequency) in words {
            match engine.insert(word.as_ref(), frequency) {
                Ok(()) => report.inserted += 1,
                Err(err) => {
                    warn!(%err, "skipping word");
                    report.rejected.push(err);
                }
            }
        }
        self.invalidate();
        report
    }

    pub fn contains(&self, word: &str) -> bool {
        self.current_engine()
            .map(|engine| engine.contains(word))
            .unwrap_or(false)
    }

    pub fn frequency(&self, word: &str) -> Option<u32> {
        self.current_engine()?.frequency(word)
    }

    /// Ranked suggestions for `keys` from the current engine.
    ///
    /// Never fails: no engine, or an unavailable one, yields an empty list.
    pub fn suggestions(&self, keys: &[usize]) -> Vec<Candidate> {
        let Some(engine) = self.current_engine() else {
            return Vec::new();
        };
        if !engine.is_available() {
            return Vec::new();
        }
        let start = Instant::now();
        if !engine.wants_cache() {
            let results = engine.suggestions(keys);
            self.metrics.record_query(start.elapsed(), false);
            return results;
        }

        let key = sequence_key(keys);
        if let Some(hit) = self.cache.get(&key) {
            self.metrics.record_query(start.elapsed(), true);
            return hit;
        }
        // a clear while the engine runs makes this result stale
        let epoch = self.cache.epoch();
        let results = engine.suggestions(keys);
        self.cache.put_if_epoch(key, results.clone(), epoch);
        self.metrics.record_query(start.elapsed(), false);
        results
    }

    /// Ranked prefix completions from the current engine (uncached).
    pub fn completions(&self, keys: &[usize], limit: usize) -> Vec<Candidate> {
        match self.current_engine() {
            Some(engine) if engine.is_available() => engine.completions(keys, limit),
            _ => Vec::new(),
        }
    }

    /// Run `suggestions(keys)` on a worker thread.
    ///
    /// The query supersedes every earlier one; its result lands in
    /// [`latest_suggestions`](Self::latest_suggestions) only if no newer query
    /// was issued meanwhile. The handle yields whether the result was applied.
    /// If no thread can be spawned the query runs inline and `None` is
    /// returned.
    pub fn query_in_background(self: &Arc<Self>, keys: Vec<usize>) -> Option<JoinHandle<bool>> {
        let ticket = self.slot.issue();
        let manager = Arc::clone(self);
        let worker_keys = keys.clone();
        let spawned = thread::Builder::new()
            .name("swipekeys-query".to_string())
            .spawn(move || {
                let suggestions = manager.suggestions(&worker_keys);
                manager.slot.offer(SuggestionUpdate {
                    ticket,
                    keys: worker_keys,
                    suggestions,
                })
            });
        match spawned {
            Ok(handle) => Some(handle),
            Err(err) => {
                warn!(%err, "could not spawn query worker; answering inline");
                let suggestions = self.suggestions(&keys);
                self.slot.offer(SuggestionUpdate {
                    ticket,
                    keys,
                    suggestions,
                });
                None
            }
        }
    }

    /// Result of the newest applied background query.
    pub fn latest_suggestions(&self) -> SuggestionUpdate {
        self.slot.latest()
    }

    /// Drop cached results and supersede in-flight queries.
    pub fn invalidate(&self) {
        self.cache.clear();
        self.slot.invalidate();
    }

    /// Drop every word from the current engine.
    pub fn clear_dictionary(&self) {
        if let Some(engine) = self.current_engine() {
            engine.clear();
        }
        self.invalidate();
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.cache.memory_bytes())
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache.capacity()
    }
}
