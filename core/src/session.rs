//! Keyboard session management.
//!
//! `KeyboardSession` ties a layout, the input sequencer and a shared
//! [`PredictionEngineManager`] together, so a front-end only forwards
//! gestures and reads suggestions back. The session owns no global state;
//! several sessions may share one manager.

use crate::candidate::Candidate;
use crate::engine::TrieEngine;
use crate::error::PredictionError;
use crate::geometry::SwipeVector;
use crate::layout::KeyboardLayoutDescriptor;
use crate::lexicon::LexiconEngine;
use crate::manager::{MemoryPreferences, PredictionEngineManager, SuggestionUpdate};
use crate::sequencer::{InputSequencer, SequencerEvent};
use crate::Config;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct KeyboardSession {
    layout: KeyboardLayoutDescriptor,
    sequencer: InputSequencer,
    manager: Arc<PredictionEngineManager>,
    suggestion_limit: usize,
    learn_on_commit: bool,
}

impl KeyboardSession {
    /// Create a session on `layout`, applying its grouping to the manager's
    /// current engine.
    pub fn new(layout: KeyboardLayoutDescriptor, manager: Arc<PredictionEngineManager>) -> Self {
        let defaults = Config::default();
        let mut session = Self {
            sequencer: InputSequencer::for_layout(&layout),
            layout,
            manager,
            suggestion_limit: defaults.suggestion_limit,
            learn_on_commit: defaults.learn_on_commit,
        };
        session.apply_grouping();
        session
    }

    /// Build the whole pipeline from configuration.
    ///
    /// Registers the trie engine and the lexicon engine (loaded from
    /// `lexicon_path` when set), selects `engine` if it is available, and
    /// seeds `custom_words`. Words the layout cannot type are logged and
    /// skipped.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let layout = config.resolve_layout()?;
        let manager = Arc::new(PredictionEngineManager::from_config(
            config,
            Arc::new(MemoryPreferences::new()),
        ));
        manager.register(Arc::new(TrieEngine::new()));
        let lexicon = match &config.lexicon_path {
            Some(path) => LexiconEngine::load_fst(path)?,
            None => LexiconEngine::new(),
        };
        manager.register(Arc::new(lexicon));
        if !manager.switch_to_engine(&config.engine) {
            warn!(engine = %config.engine, "keeping default prediction engine");
        }

        let mut session = Self::new(layout, manager);
        session.suggestion_limit = config.suggestion_limit;
        session.learn_on_commit = config.learn_on_commit;

        let report = session.manager.import_words(
            config
                .custom_words
                .iter()
                .map(|w| (w.word.as_str(), w.frequency)),
        );
        debug!(
            inserted = report.inserted,
            rejected = report.rejected.len(),
            "custom words imported"
        );
        Ok(session)
    }

    pub fn layout(&self) -> &KeyboardLayoutDescriptor {
        &self.layout
    }

    pub fn sequencer(&self) -> &InputSequencer {
        &self.sequencer
    }

    pub fn manager(&self) -> &Arc<PredictionEngineManager> {
        &self.manager
    }

    pub fn set_suggestion_limit(&mut self, limit: usize) {
        self.suggestion_limit = limit;
    }

    /// Switch layout. Clears the entered sequence and re-keys the engine.
    pub fn set_layout(&mut self, layout: KeyboardLayoutDescriptor) {
        self.sequencer.set_layout(&layout);
        self.layout = layout;
        self.apply_grouping();
    }

    /// Switch prediction engine and apply the current grouping to it.
    pub fn switch_engine(&mut self, id: &str) -> bool {
        if !self.manager.switch_to_engine(id) {
            return false;
        }
        self.apply_grouping();
        true
    }

    fn apply_grouping(&self) {
        self.manager
            .set_key_letter_grouping(&self.layout.letter_groups, self.layout.exact_letters());
    }

    pub fn swipe(&mut self, vector: SwipeVector) -> SequencerEvent {
        self.sequencer.swipe(vector)
    }

    pub fn tap(&mut self, key: usize) -> SequencerEvent {
        self.sequencer.tap(key)
    }

    pub fn delete_last(&mut self) -> Option<usize> {
        self.sequencer.delete_last()
    }

    pub fn reset(&mut self) {
        self.sequencer.reset();
    }

    pub fn key_sequence(&self) -> &[usize] {
        self.sequencer.sequence()
    }

    /// The entered letters, for layouts where every key names one letter.
    pub fn entered_letters(&self) -> Option<String> {
        if !self.layout.exact_letters() {
            return None;
        }
        self.key_sequence()
            .iter()
            .map(|&code| u32::try_from(code).ok().and_then(char::from_u32))
            .collect()
    }

    /// Top suggestions for the entered sequence.
    pub fn suggestions(&self) -> Vec<Candidate> {
        if self.sequencer.is_empty() {
            return Vec::new();
        }
        let mut found = self.manager.suggestions(self.key_sequence());
        found.truncate(self.suggestion_limit);
        found
    }

    /// Top words whose key path starts with the entered sequence.
    pub fn completions(&self) -> Vec<Candidate> {
        if self.sequencer.is_empty() {
            return Vec::new();
        }
        self.manager
            .completions(self.key_sequence(), self.suggestion_limit)
    }

    /// Query the entered sequence on a worker thread.
    pub fn refresh_in_background(&self) -> Option<JoinHandle<bool>> {
        self.manager
            .query_in_background(self.key_sequence().to_vec())
    }

    pub fn latest_suggestions(&self) -> SuggestionUpdate {
        self.manager.latest_suggestions()
    }

    /// Accept `word` as typed and start a new word.
    ///
    /// With learning enabled the word's frequency goes up by one (new words
    /// start at 1). The sequence is cleared even if the word is rejected.
    pub fn commit(&mut self, word: &str) -> Result<(), PredictionError> {
        let result = if self.learn_on_commit {
            let frequency = self.manager.frequency(word).unwrap_or(0).saturating_add(1);
            self.manager.insert(word, frequency)
        } else {
            Ok(())
        };
        self.sequencer.reset();
        result
    }

    /// Commit the best suggestion, if there is one.
    pub fn commit_top(&mut self) -> Result<Option<String>, PredictionError> {
        let Some(top) = self.suggestions().into_iter().next() else {
            return Ok(None);
        };
        self.commit(&top.word)?;
        Ok(Some(top.word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ControlAction;
    use crate::CustomWord;

    fn word(word: &str, frequency: u32) -> CustomWord {
        CustomWord {
            word: word.to_string(),
            frequency,
        }
    }

    #[test]
    fn test_swipes_to_suggestions() {
        let mut config = Config::default();
        config.custom_words = vec![word("hi", 10), word("gi", 3), word("to", 5)];
        let mut session = KeyboardSession::from_config(&config).unwrap();

        // "h" and "i" both sit on the right key
        assert_eq!(session.swipe(SwipeVector::new(12.0, 1.0)), SequencerEvent::Appended(1));
        session.swipe(SwipeVector::new(30.0, -2.0));
        assert_eq!(session.key_sequence(), &[1, 1]);
        let words: Vec<_> = session.suggestions().into_iter().map(|c| c.word).collect();
        assert_eq!(words, vec!["hi", "gi"]);

        session.reset();
        session.swipe(SwipeVector::new(0.0, 20.0));
        session.swipe(SwipeVector::new(-20.0, 0.0));
        assert_eq!(session.suggestions()[0].word, "to");
    }

    #[test]
    fn test_commit_learns() {
        let mut config = Config::default();
        config.custom_words = vec![word("hi", 10), word("gi", 9)];
        let mut session = KeyboardSession::from_config(&config).unwrap();
        session.tap(1);
        session.tap(1);
        assert_eq!(session.commit_top().unwrap().as_deref(), Some("hi"));
        assert!(session.key_sequence().is_empty());
        assert_eq!(session.manager().frequency("hi"), Some(11));

        session.commit("gig").unwrap();
        assert_eq!(session.manager().frequency("gig"), Some(1));
        assert!(session.commit("g1").is_err());
    }

    #[test]
    fn test_msr_session() {
        let mut config = Config::default();
        config.layout = "msr".into();
        config.custom_words = vec![word("be", 4)];
        let mut session = KeyboardSession::from_config(&config).unwrap();

        assert_eq!(session.tap(0), SequencerEvent::DetailOpened(0));
        session.tap(1);
        session.tap(0);
        session.tap(4);
        assert_eq!(session.entered_letters().as_deref(), Some("be"));
        assert_eq!(session.suggestions()[0].word, "be");

        session.tap(5);
        assert_eq!(session.tap(3), SequencerEvent::Control(ControlAction::Delete));
        assert_eq!(session.entered_letters().as_deref(), Some("b"));
    }

    #[test]
    fn test_layout_change_rekeys() {
        let mut config = Config::default();
        config.custom_words = vec![word("eh", 1)];
        let mut session = KeyboardSession::from_config(&config).unwrap();
        session.tap(0);
        session.set_layout(KeyboardLayoutDescriptor::six());
        assert!(session.key_sequence().is_empty());

        // stored words keep the path of the grouping they were inserted under
        session.tap(0);
        session.tap(1);
        assert_eq!(session.suggestions()[0].word, "eh");

        // re-inserting moves the word onto the new path
        session.commit("eh").unwrap();
        session.tap(0);
        session.tap(1);
        assert!(session.suggestions().is_empty());
        session.reset();
        session.tap(1);
        session.tap(1);
        assert_eq!(session.suggestions()[0].word, "eh");
    }

    #[test]
    fn test_unavailable_engine_keeps_trie() {
        let mut config = Config::default();
        config.engine = "lexicon".into();
        let session = KeyboardSession::from_config(&config).unwrap();
        assert_eq!(session.manager().current_engine_id().as_deref(), Some("trie"));
    }
}
