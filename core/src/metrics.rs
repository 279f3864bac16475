//! Query instrumentation for prediction engines.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Lock-free counters updated on every suggestion query.
#[derive(Debug, Default)]
pub struct EngineMetrics {
    queries: AtomicU64,
    cache_hits: AtomicU64,
    latency_nanos: AtomicU64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_query(&self, latency: Duration, cache_hit: bool) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
        self.queries.fetch_add(1, Ordering::Relaxed);
        self.latency_nanos.fetch_add(nanos, Ordering::Relaxed);
        if cache_hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Current counters; `memory_bytes` is supplied by the cache owner.
    pub fn snapshot(&self, memory_bytes: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            query_count: self.queries.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            total_latency: Duration::from_nanos(self.latency_nanos.load(Ordering::Relaxed)),
            memory_bytes,
        }
    }

    pub fn reset(&self) {
        self.queries.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.latency_nanos.store(0, Ordering::Relaxed);
    }
}

/// Point-in-time view of [`EngineMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub query_count: u64,
    pub cache_hits: u64,
    pub total_latency: Duration,
    /// Estimated bytes held by cached keys and suggestion lists.
    pub memory_bytes: usize,
}

impl MetricsSnapshot {
    /// Mean latency per query, `None` before the first query.
    pub fn average_latency(&self) -> Option<Duration> {
        if self.query_count == 0 {
            return None;
        }
        let nanos = self.total_latency.as_nanos() / u128::from(self.query_count);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }

    /// Cache hit rate as a percentage (0.0 to 100.0).
    ///
    /// Returns None if no queries have been made yet.
    pub fn cache_hit_rate(&self) -> Option<f32> {
        if self.query_count == 0 {
            None
        } else {
            Some((self.cache_hits as f32 / self.query_count as f32) * 100.0)
        }
    }
}
