//! Bounded suggestion caches keyed by serialized key sequences.
//!
//! Caching only saves work: every failure here (a poisoned lock, a zero
//! capacity) degrades to a miss and the caller recomputes.
//!
//! Each cache carries an epoch that `clear` advances under the same lock that
//! guards the entries. A query reads the epoch before computing and stores
//! its result with [`SuggestionCache::put_if_epoch`], so a result computed
//! before a clear can never land after it.
use crate::candidate::Candidate;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;

/// Cache key for a key sequence: the indices joined with commas.
pub fn sequence_key(keys: &[usize]) -> String {
    keys.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn entry_bytes(key: &str, value: &[Candidate]) -> usize {
    key.len() + value.iter().map(Candidate::size_bytes).sum::<usize>()
}

/// Interface shared by the cache implementations so the eviction strategy
/// can change without touching callers.
pub trait SuggestionCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Vec<Candidate>>;
    fn put(&self, key: String, value: Vec<Candidate>);
    /// Store `value` only if no `clear` happened since `epoch` was read.
    /// Returns whether the value was stored.
    fn put_if_epoch(&self, key: String, value: Vec<Candidate>, epoch: u64) -> bool;
    /// Current epoch; advanced by every `clear`.
    fn epoch(&self) -> u64;
    fn clear(&self);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Maximum number of entries held at once.
    fn capacity(&self) -> usize;
    /// Estimated bytes of keys and values currently held.
    fn memory_bytes(&self) -> usize;
}

/// Eviction strategy selected through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    /// Drop a batch of the oldest entries when full.
    #[default]
    Bulk,
    /// Strict least-recently-used eviction.
    Lru,
}

/// Build a cache for `policy`. `evict_batch` only applies to [`CachePolicy::Bulk`].
pub fn new_cache(
    policy: CachePolicy,
    max_entries: usize,
    evict_batch: usize,
) -> Arc<dyn SuggestionCache> {
    match policy {
        CachePolicy::Bulk => Arc::new(BulkEvictionCache::new(max_entries, evict_batch)),
        CachePolicy::Lru => Arc::new(LruSuggestionCache::new(max_entries)),
    }
}

#[derive(Debug, Default)]
struct BulkState {
    entries: AHashMap<String, Vec<Candidate>>,
    order: VecDeque<String>,
    bytes: usize,
    epoch: u64,
}

/// Read-mostly cache that evicts a batch of the oldest insertions once full.
///
/// Reads share an `RwLock` read guard; writes take the write guard for a
/// short, allocation-only critical section. Recency is not tracked: a miss
/// is cheap, so bulk eviction beats per-read bookkeeping here.
#[derive(Debug)]
pub struct BulkEvictionCache {
    inner: RwLock<BulkState>,
    max_entries: usize,
    evict_batch: usize,
}

impl BulkEvictionCache {
    pub const DEFAULT_MAX_ENTRIES: usize = 1000;
    pub const DEFAULT_EVICT_BATCH: usize = 100;

    pub fn new(max_entries: usize, evict_batch: usize) -> Self {
        Self {
            inner: RwLock::new(BulkState::default()),
            max_entries,
            evict_batch: evict_batch.max(1),
        }
    }

    pub fn evict_batch(&self) -> usize {
        self.evict_batch
    }

    fn store(&self, state: &mut BulkState, key: String, value: Vec<Candidate>) {
        let added = entry_bytes(&key, &value);
        if let Some(old) = state.entries.get_mut(&key) {
            let removed = entry_bytes(&key, old);
            *old = value;
            state.bytes = state.bytes.saturating_sub(removed) + added;
            return;
        }
        if state.entries.len() >= self.max_entries {
            let batch = self.evict_batch.min(state.order.len());
            for _ in 0..batch {
                if let Some(oldest) = state.order.pop_front() {
                    if let Some(gone) = state.entries.remove(&oldest) {
                        state.bytes = state.bytes.saturating_sub(entry_bytes(&oldest, &gone));
                    }
                }
            }
            debug!(evicted = batch, remaining = state.entries.len(), "suggestion cache evicted batch");
        }
        state.order.push_back(key.clone());
        state.entries.insert(key, value);
        state.bytes += added;
    }
}

impl Default for BulkEvictionCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ENTRIES, Self::DEFAULT_EVICT_BATCH)
    }
}

impl SuggestionCache for BulkEvictionCache {
    fn get(&self, key: &str) -> Option<Vec<Candidate>> {
        let state = self.inner.read().ok()?;
        state.entries.get(key).cloned()
    }

    fn put(&self, key: String, value: Vec<Candidate>) {
        if self.max_entries == 0 {
            return;
        }
        if let Ok(mut state) = self.inner.write() {
            self.store(&mut state, key, value);
        }
    }

    fn put_if_epoch(&self, key: String, value: Vec<Candidate>, epoch: u64) -> bool {
        if self.max_entries == 0 {
            return false;
        }
        let Ok(mut state) = self.inner.write() else {
            return false;
        };
        if state.epoch != epoch {
            debug!(key = %key, epoch, current = state.epoch, "dropping result from before a clear");
            return false;
        }
        self.store(&mut state, key, value);
        true
    }

    fn epoch(&self) -> u64 {
        self.inner.read().map(|s| s.epoch).unwrap_or(u64::MAX)
    }

    fn clear(&self) {
        if let Ok(mut state) = self.inner.write() {
            let epoch = state.epoch.wrapping_add(1);
            *state = BulkState {
                epoch,
                ..BulkState::default()
            };
        }
    }

    fn len(&self) -> usize {
        self.inner.read().map(|s| s.entries.len()).unwrap_or(0)
    }

    fn capacity(&self) -> usize {
        self.max_entries
    }

    fn memory_bytes(&self) -> usize {
        self.inner.read().map(|s| s.bytes).unwrap_or(0)
    }
}

/// Strict LRU cache backed by the `lru` crate.
///
/// Reads update recency, so every access takes the mutex.
#[derive(Debug)]
pub struct LruSuggestionCache {
    inner: Mutex<LruState>,
}

#[derive(Debug)]
struct LruState {
    entries: lru::LruCache<String, Vec<Candidate>>,
    epoch: u64,
}

impl LruSuggestionCache {
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruState {
                entries: lru::LruCache::new(capacity),
                epoch: 0,
            }),
        }
    }
}

impl SuggestionCache for LruSuggestionCache {
    fn get(&self, key: &str) -> Option<Vec<Candidate>> {
        let mut state = self.inner.lock().ok()?;
        state.entries.get(key).cloned()
    }

    fn put(&self, key: String, value: Vec<Candidate>) {
        if let Ok(mut state) = self.inner.lock() {
            state.entries.put(key, value);
        }
    }

    fn put_if_epoch(&self, key: String, value: Vec<Candidate>, epoch: u64) -> bool {
        let Ok(mut state) = self.inner.lock() else {
            return false;
        };
        if state.epoch != epoch {
            debug!(key = %key, epoch, current = state.epoch, "dropping result from before a clear");
            return false;
        }
        state.entries.put(key, value);
        true
    }

    fn epoch(&self) -> u64 {
        self.inner.lock().map(|s| s.epoch).unwrap_or(u64::MAX)
    }

    fn clear(&self) {
        if let Ok(mut state) = self.inner.lock() {
            state.entries.clear();
            state.epoch = state.epoch.wrapping_add(1);
        }
    }

    fn len(&self) -> usize {
        self.inner.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    fn capacity(&self) -> usize {
        self.inner.lock().map(|s| s.entries.cap().get()).unwrap_or(0)
    }

    fn memory_bytes(&self) -> usize {
        self.inner
            .lock()
            .map(|s| s.entries.iter().map(|(k, v)| entry_bytes(k, v)).sum())
            .unwrap_or(0)
    }
}
