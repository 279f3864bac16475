//! Key-index trie for ambiguous-keyboard word prediction.
use crate::candidate::{sort_by_frequency, Candidate};
use crate::error::PredictionError;
use crate::layout::KeyLetterGrouping;
use ahash::AHashMap;
use tracing::debug;

/// A node of the prediction trie.
///
/// Children are keyed by key index, not by letter: every word whose letters
/// fall on the same keys shares the path. `words` holds the words ending at
/// this node, sorted by descending frequency, which is exactly the ranked
/// candidate list for the path.
#[derive(Debug, Default)]
pub struct TrieNode {
    children: AHashMap<usize, Box<TrieNode>>,
    words: Vec<Candidate>,
}

impl TrieNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Words ending at this node, highest frequency first.
    pub fn words(&self) -> &[Candidate] {
        &self.words
    }

    fn child(&self, key: usize) -> Option<&TrieNode> {
        self.children.get(&key).map(|c| c.as_ref())
    }

    fn descend(&self, keys: &[usize]) -> Option<&TrieNode> {
        let mut node = self;
        for &key in keys {
            node = node.child(key)?;
        }
        Some(node)
    }

    fn descend_mut(&mut self, keys: &[usize]) -> Option<&mut TrieNode> {
        let mut node = self;
        for key in keys {
            node = node.children.get_mut(key)?;
        }
        Some(node)
    }

    /// Place `word` before the first entry whose frequency is <= its own.
    fn insert_ranked(&mut self, word: &str, frequency: u32) {
        let at = self
            .words
            .iter()
            .position(|c| c.frequency <= frequency)
            .unwrap_or(self.words.len());
        self.words.insert(at, Candidate::new(word, frequency));
    }

    fn remove_word(&mut self, word: &str) {
        self.words.retain(|c| c.word != word);
    }

    /// Depth-first, children in key order, so ties come out the same way on
    /// every instance.
    fn collect_into(&self, out: &mut Vec<Candidate>) {
        out.extend(self.words.iter().cloned());
        let mut keys: Vec<usize> = self.children.keys().copied().collect();
        keys.sort_unstable();
        for key in keys {
            if let Some(child) = self.child(key) {
                child.collect_into(out);
            }
        }
    }
}

#[derive(Debug, Clone)]
struct WordEntry {
    frequency: u32,
    keys: Vec<usize>,
}

/// Frequency-ranked word store addressed by key sequences.
///
/// A word table sits next to the trie for O(1) membership checks. Every table
/// entry records the key path it was inserted under, so the table and the
/// trie stay consistent even across grouping changes.
///
/// # Example
/// ```
/// use swipekeys_core::trie::PredictionTrie;
///
/// let mut trie = PredictionTrie::new();
/// trie.set_key_letter_grouping(&["abc", "def", "ghi"], false);
/// trie.insert("bad", 10).unwrap();
/// trie.insert("ace", 30).unwrap();
///
/// let words: Vec<_> = trie.suggestions(&[0, 0, 1]).into_iter().map(|c| c.word).collect();
/// assert_eq!(words, vec!["ace", "bad"]);
/// assert!(trie.contains("bad"));
/// ```
#[derive(Debug, Default)]
pub struct PredictionTrie {
    root: TrieNode,
    grouping: KeyLetterGrouping,
    table: AHashMap<String, WordEntry>,
}

impl PredictionTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trie using the grouping of an existing layout.
    pub fn with_grouping(grouping: KeyLetterGrouping) -> Self {
        Self {
            grouping,
            ..Self::default()
        }
    }

    /// Rebuild the letter → key table.
    ///
    /// Existing words keep the paths they were inserted under; words whose
    /// letters now fall on different keys become unreachable until they are
    /// inserted again.
    pub fn set_key_letter_grouping<S: AsRef<str>>(&mut self, groups: &[S], two_strokes: bool) {
        self.grouping = KeyLetterGrouping::new(groups, two_strokes);
        debug!(
            letters = self.grouping.len(),
            two_strokes,
            words = self.table.len(),
            "trie grouping rebuilt"
        );
    }

    pub fn grouping(&self) -> &KeyLetterGrouping {
        &self.grouping
    }

    /// Key path of `word` under the current grouping.
    pub fn key_sequence_for(&self, word: &str) -> Result<Vec<usize>, PredictionError> {
        self.grouping.key_sequence_for(word)
    }

    /// Insert or re-rank a word.
    ///
    /// Fails without touching the trie when any character has no key.
    /// Re-inserting a word replaces its previous entry. Empty words are
    /// ignored.
    pub fn insert(&mut self, word: &str, frequency: u32) -> Result<(), PredictionError> {
        if word.is_empty() {
            return Ok(());
        }
        let keys = self.grouping.key_sequence_for(word)?;

        if let Some(previous) = self.table.remove(word) {
            if let Some(node) = self.root.descend_mut(&previous.keys) {
                node.remove_word(word);
            }
        }

        let mut node = &mut self.root;
        for &key in &keys {
            node = node.children.entry(key).or_default();
        }
        node.insert_ranked(word, frequency);
        self.table
            .insert(word.to_string(), WordEntry { frequency, keys });
        Ok(())
    }

    /// O(1) membership check against the word table.
    pub fn contains(&self, word: &str) -> bool {
        self.table.contains_key(word)
    }

    pub fn frequency(&self, word: &str) -> Option<u32> {
        self.table.get(word).map(|e| e.frequency)
    }

    /// Words whose key path is exactly `keys`, highest frequency first.
    ///
    /// Any key without a child yields an empty list.
    pub fn suggestions(&self, keys: &[usize]) -> Vec<Candidate> {
        self.root
            .descend(keys)
            .map(|node| node.words.clone())
            .unwrap_or_default()
    }

    /// Words whose key path starts with `keys`, highest frequency first.
    pub fn completions(&self, keys: &[usize], limit: usize) -> Vec<Candidate> {
        let Some(node) = self.root.descend(keys) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        node.collect_into(&mut out);
        sort_by_frequency(&mut out);
        out.truncate(limit);
        out
    }

    /// Every stored word with its frequency, in no particular order.
    pub fn words(&self) -> impl Iterator<Item = Candidate> + '_ {
        self.table
            .iter()
            .map(|(word, entry)| Candidate::new(word.clone(), entry.frequency))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Drop every word. The grouping is kept.
    pub fn clear(&mut self) {
        self.root = TrieNode::new();
        self.table.clear();
    }
}
