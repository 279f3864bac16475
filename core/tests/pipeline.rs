// core/tests/pipeline.rs
//
// End-to-end tests from swipe vectors to ranked suggestions.
//
// Tests cover:
// - Classification of the cardinal swipes and direction hints
// - Dictionary round trip and frequency ranking
// - Rejected words leave the dictionary untouched
// - Two-stroke and master/detail sequencing
// - Repeated queries return identical results

use std::sync::Arc;
use swipekeys_core::{
    direction, geometry, Candidate, Config, ControlAction, CustomWord, Direction, InputMode,
    InputSequencer, KeyboardLayoutDescriptor, KeyboardSession, MemoryPreferences, MsrState,
    PredictionEngineManager, PredictionError, PredictionTrie, SectorLayout, SequencerEvent,
    SwipeVector, TrieEngine,
};

fn groups(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn cardinal_swipes_on_four_keys() {
    let cases = [
        ((100.0, 0.0), 1),
        ((0.0, 100.0), 3),
        ((-100.0, 0.0), 2),
        ((0.0, -100.0), 0),
    ];
    for ((dx, dy), key) in cases {
        let vector = SwipeVector::new(dx, dy);
        assert_eq!(geometry::classify(vector, SectorLayout::Four), Some(key));
        assert_eq!(geometry::classify_with_count(vector, 4), Some(key));
    }
}

#[test]
fn classification_is_deterministic_for_all_layouts() {
    let vectors = [
        SwipeVector::new(3.0, 7.0),
        SwipeVector::new(-50.0, 12.0),
        SwipeVector::new(8.0, -90.0),
        SwipeVector::new(-1.0, -1.0),
    ];
    for count in [4, 6, 8, -1, -2, -3] {
        for vector in vectors {
            let first = geometry::classify_with_count(vector, count);
            assert!(first.is_some(), "count {count} gave no key");
            assert_eq!(first, geometry::classify_with_count(vector, count));
        }
    }
}

#[test]
fn direction_hints() {
    assert_eq!(direction(SwipeVector::new(100.0, 10.0)), Direction::Right);
    assert_eq!(direction(SwipeVector::new(-100.0, 10.0)), Direction::Left);
    assert_eq!(direction(SwipeVector::new(10.0, -100.0)), Direction::Up);
    assert_eq!(direction(SwipeVector::new(10.0, 100.0)), Direction::Down);
}

#[test]
fn trie_round_trip_for_every_layout_alphabet() {
    for name in KeyboardLayoutDescriptor::builtin_names() {
        let layout = KeyboardLayoutDescriptor::builtin(name).unwrap();
        let mut trie = PredictionTrie::new();
        trie.set_key_letter_grouping(&layout.letter_groups, layout.exact_letters());
        for word in ["keyboard", "swipe", "zebra", "a"] {
            trie.insert(word, 7).unwrap();
            let keys = trie.key_sequence_for(word).unwrap();
            assert!(
                trie.suggestions(&keys).contains(&Candidate::new(word, 7)),
                "{word} missing on {name}"
            );
            assert!(trie.contains(word));
        }
    }
}

#[test]
fn suggestions_ranked_by_frequency() {
    let mut trie = PredictionTrie::new();
    trie.set_key_letter_grouping(&groups(&["abc", "def"]), false);
    trie.insert("ad", 50).unwrap();
    trie.insert("be", 10).unwrap();
    trie.insert("cf", 90).unwrap();
    let ranked: Vec<u32> = trie.suggestions(&[0, 1]).iter().map(|c| c.frequency).collect();
    assert_eq!(ranked, vec![90, 50, 10]);
}

#[test]
fn unsupported_character_leaves_trie_intact() {
    let mut trie = PredictionTrie::new();
    trie.set_key_letter_grouping(&groups(&["abc", "def"]), false);
    trie.insert("bad", 4).unwrap();

    let err = trie.insert("abc1", 9).unwrap_err();
    assert_eq!(
        err,
        PredictionError::UnsupportedWord {
            word: "abc1".to_string(),
            ch: '1'
        }
    );
    assert!(!trie.contains("abc1"));
    assert_eq!(trie.suggestions(&[0, 0, 1]), vec![Candidate::new("bad", 4)]);
    assert_eq!(trie.len(), 1);
}

#[test]
fn two_stroke_pair_appends_one_letter() {
    let mut seq = InputSequencer::new(InputMode::TwoStroke);
    assert_eq!(seq.first_stroke_entered(2, false), SequencerEvent::StrokePending(2));
    assert_eq!(seq.pending_first_stroke(), Some(2));
    assert!(seq.sequence().is_empty());

    seq.second_stroke_entered(3, false);
    assert_eq!(seq.pending_first_stroke(), None);
    assert_eq!(seq.sequence().len(), 1);
    assert_eq!(seq.sequence(), &['n' as usize]);
}

#[test]
fn second_stroke_without_first_is_noop() {
    let mut seq = InputSequencer::new(InputMode::TwoStroke);
    assert_eq!(seq.second_stroke_entered(3, true), SequencerEvent::Ignored);
    assert!(seq.sequence().is_empty());
    assert_eq!(seq.pending_first_stroke(), None);
}

#[test]
fn master_detail_appends_after_two_gestures() {
    let mut seq = InputSequencer::new(InputMode::MasterDetail);
    assert_eq!(seq.msr_key_entered(1, false), SequencerEvent::DetailOpened(1));
    assert_eq!(seq.msr_state(), MsrState::Detail(1));
    assert!(seq.sequence().is_empty());

    assert_eq!(seq.msr_key_entered(2, false), SequencerEvent::Appended('h' as usize));
    assert_eq!(seq.msr_state(), MsrState::Master);
    assert_eq!(seq.sequence().len(), 1);

    // control keys never reach the sequence
    seq.msr_key_entered(5, false);
    assert_eq!(
        seq.msr_key_entered(1, false),
        SequencerEvent::Control(ControlAction::Yes)
    );
    seq.msr_key_entered(0, false);
    seq.msr_key_entered(5, false);
    assert_eq!(seq.sequence(), &['h' as usize]);
    assert_eq!(seq.msr_state(), MsrState::Master);
}

#[test]
fn two_stroke_session_from_swipes() {
    let config = Config {
        layout: "two-stroke".into(),
        custom_words: vec![CustomWord {
            word: "no".into(),
            frequency: 3,
        }],
        ..Config::default()
    };
    let mut session = KeyboardSession::from_config(&config).unwrap();

    // up-left picks "klmno"; down-right then down pick "n" and "o"
    let up_left = SwipeVector::new(-60.0, -40.0);
    assert_eq!(session.swipe(up_left), SequencerEvent::StrokePending(2));
    session.tap(3);
    session.swipe(up_left);
    session.tap(4);
    assert_eq!(session.entered_letters().as_deref(), Some("no"));
    assert_eq!(session.suggestions(), vec![Candidate::new("no", 3)]);
}

#[test]
fn repeated_queries_are_identical() {
    let manager = Arc::new(PredictionEngineManager::new(
        Arc::new(swipekeys_core::BulkEvictionCache::default()),
        Arc::new(MemoryPreferences::new()),
    ));
    manager.register(Arc::new(TrieEngine::new()));
    let session = KeyboardSession::new(KeyboardLayoutDescriptor::eight(), Arc::clone(&manager));
    for (word, frequency) in [("ad", 2), ("be", 9), ("cf", 2), ("ae", 5)] {
        manager.insert(word, frequency).unwrap();
    }
    let first = manager.suggestions(&[0, 1]);
    let second = manager.suggestions(&[0, 1]);
    assert_eq!(first, second);
    assert_eq!(first[0].word, "be");
    assert!(session.suggestions().is_empty());
}
