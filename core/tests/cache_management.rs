// core/tests/cache_management.rs
//
// Integration tests for suggestion cache management in the engine manager.
//
// Tests cover:
// - Cache size never exceeds Config.max_cache_size
// - Evicted sequences are recomputed on the next query
// - Hit/miss tracking and the hit rate statistic
// - Cache invalidation on insert and grouping change
// - Both eviction policies behind the same interface

use std::sync::Arc;
use swipekeys_core::{
    CachePolicy, Config, LexiconEngine, MemoryPreferences, PredictionEngine,
    PredictionEngineManager,
};

const GROUPS: [&str; 4] = ["abcdef", "ghijklm", "nopqrs", "tuvwxyz"];

fn groups() -> Vec<String> {
    GROUPS.iter().map(|s| s.to_string()).collect()
}

// Every three-letter word over "agnt" so each key sequence of length three
// has exactly one word.
fn lexicon_words() -> Vec<(String, u32)> {
    let letters = ['a', 'g', 'n', 't'];
    let mut words = Vec::new();
    for (i, a) in letters.iter().enumerate() {
        for (j, b) in letters.iter().enumerate() {
            for (k, c) in letters.iter().enumerate() {
                let word: String = [a, b, c].into_iter().collect();
                words.push((word, (i * 16 + j * 4 + k + 1) as u32));
            }
        }
    }
    words
}

fn manager_with(config: &Config) -> PredictionEngineManager {
    let manager = PredictionEngineManager::from_config(config, Arc::new(MemoryPreferences::new()));
    let lexicon = LexiconEngine::from_words(lexicon_words()).expect("build lexicon");
    manager.register(Arc::new(lexicon));
    manager.set_key_letter_grouping(&groups(), false);
    manager
}

fn all_sequences() -> Vec<Vec<usize>> {
    let mut out = Vec::new();
    for a in 0..4 {
        for b in 0..4 {
            for c in 0..4 {
                out.push(vec![a, b, c]);
            }
        }
    }
    out
}

#[test]
fn test_cache_is_strictly_bounded() {
    let config = Config {
        max_cache_size: 10,
        cache_evict_batch: 3,
        ..Config::default()
    };
    let manager = manager_with(&config);
    assert_eq!(manager.cache_capacity(), 10);

    for keys in all_sequences() {
        let got = manager.suggestions(&keys);
        assert_eq!(got.len(), 1);
        assert!(manager.cache_len() <= 10);
    }
}

#[test]
fn test_evicted_entries_are_recomputed() {
    let config = Config {
        max_cache_size: 4,
        cache_evict_batch: 2,
        ..Config::default()
    };
    let manager = manager_with(&config);
    let sequences = all_sequences();

    let first = manager.suggestions(&sequences[0]);
    for keys in &sequences[1..20] {
        manager.suggestions(keys);
    }
    manager.reset_metrics();

    // long gone from the cache, so this is a miss with the same answer
    let again = manager.suggestions(&sequences[0]);
    assert_eq!(again, first);
    let metrics = manager.metrics();
    assert_eq!(metrics.query_count, 1);
    assert_eq!(metrics.cache_hits, 0);
}

#[test]
fn test_hit_rate() {
    let manager = manager_with(&Config::default());
    assert_eq!(manager.metrics().cache_hit_rate(), None);

    manager.suggestions(&[0, 1, 2]);
    manager.suggestions(&[0, 1, 2]);
    manager.suggestions(&[0, 1, 2]);
    manager.suggestions(&[3, 3, 3]);

    let metrics = manager.metrics();
    assert_eq!(metrics.query_count, 4);
    assert_eq!(metrics.cache_hits, 2);
    assert_eq!(metrics.cache_hit_rate(), Some(50.0));
    assert!(metrics.average_latency().is_some());
}

#[test]
fn test_insert_invalidates_cache() {
    let manager = manager_with(&Config::default());
    let before = manager.suggestions(&[0, 1, 2]);
    assert_eq!(before[0].word, "agn");
    assert_eq!(manager.cache_len(), 1);

    manager.insert("bin", 1000).unwrap();
    assert_eq!(manager.cache_len(), 0);
    let after = manager.suggestions(&[0, 1, 2]);
    assert_eq!(after[0].word, "bin");
    assert_eq!(after.len(), 2);
}

#[test]
fn test_grouping_change_invalidates_cache() {
    let manager = manager_with(&Config::default());
    manager.suggestions(&[0, 0, 0]);
    assert_eq!(manager.cache_len(), 1);
    manager.set_key_letter_grouping(&groups(), false);
    assert_eq!(manager.cache_len(), 0);
}

#[test]
fn test_idempotent_under_both_policies() {
    for policy in [CachePolicy::Bulk, CachePolicy::Lru] {
        let config = Config {
            cache_policy: policy,
            max_cache_size: 2,
            ..Config::default()
        };
        let manager = manager_with(&config);
        for keys in all_sequences().iter().take(8) {
            let first = manager.suggestions(keys);
            let second = manager.suggestions(keys);
            assert_eq!(first, second, "{policy:?}");
            assert!(manager.cache_len() <= 2);
        }
    }
}

#[test]
fn test_uncached_engine_skips_cache() {
    let manager = manager_with(&Config::default());
    let trie = Arc::new(swipekeys_core::TrieEngine::new());
    assert!(!trie.wants_cache());
    manager.register(trie);
    assert!(manager.switch_to_engine("trie"));
    manager.set_key_letter_grouping(&groups(), false);
    manager.insert("ago", 3).unwrap();

    manager.suggestions(&[0, 1, 2]);
    manager.suggestions(&[0, 1, 2]);
    assert_eq!(manager.cache_len(), 0);
    assert_eq!(manager.metrics().cache_hits, 0);
}
