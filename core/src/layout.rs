//! Keyboard layouts and the letter → key grouping derived from them.
use crate::error::PredictionError;
use crate::geometry::{SectorLayout, SectorTable, TWO_STROKE_GROUPS};
use crate::sequencer::InputMode;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Maps lowercase letters to key indices for the active layout.
///
/// Built from an ordered list of letter groups: a letter's key index is the
/// position of the group containing it. In exact-letter mode every letter is
/// its own key and maps to its ASCII code.
#[derive(Debug, Clone, Default)]
pub struct KeyLetterGrouping {
    keys: AHashMap<char, usize>,
    exact_letters: bool,
}

impl KeyLetterGrouping {
    /// Build a grouping from letter-group strings.
    ///
    /// With `exact_letters` the groups are ignored and `a..=z` each map to
    /// their ASCII code. A letter listed in several groups keeps the first.
    pub fn new<S: AsRef<str>>(groups: &[S], exact_letters: bool) -> Self {
        if exact_letters {
            return Self::exact();
        }
        let mut keys = AHashMap::new();
        for (index, group) in groups.iter().enumerate() {
            for ch in group.as_ref().chars() {
                keys.entry(ch.to_ascii_lowercase()).or_insert(index);
            }
        }
        Self {
            keys,
            exact_letters: false,
        }
    }

    /// One key per lowercase letter, keyed by ASCII code.
    pub fn exact() -> Self {
        let keys = ('a'..='z').map(|ch| (ch, ch as usize)).collect();
        Self {
            keys,
            exact_letters: true,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.exact_letters
    }

    pub fn key_for(&self, ch: char) -> Option<usize> {
        self.keys.get(&ch).copied()
    }

    /// Key path for `word`, failing on the first character with no key.
    pub fn key_sequence_for(&self, word: &str) -> Result<Vec<usize>, PredictionError> {
        word.chars()
            .map(|ch| {
                self.key_for(ch).ok_or_else(|| PredictionError::UnsupportedWord {
                    word: word.to_string(),
                    ch,
                })
            })
            .collect()
    }

    /// Number of distinct letters covered.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Control actions offered by the detail level of the MSR layout.
///
/// These are never appended to the key sequence; the sequencer turns them
/// into events for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    /// Return to the master level without entering anything.
    Cancel,
    /// Confirm: commit the current word.
    Yes,
    /// Deny the current proposal.
    No,
    /// Remove the last entered key.
    Delete,
    /// Speak the current word.
    Speak,
}

/// A detail-level key of the MSR layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsrKey {
    Letter(char),
    Control(ControlAction),
}

use ControlAction::{Cancel, Delete, No, Speak, Yes};
use MsrKey::{Control, Letter};

// Detail keys per master key, in six-key reading order
// (up-left, up, up-right, down-left, down, down-right). Cancel always sits
// down-right.
const MSR_DETAIL_KEYS: [[MsrKey; 6]; 6] = [
    [Letter('a'), Letter('b'), Letter('c'), Letter('d'), Letter('e'), Control(Cancel)],
    [Letter('f'), Letter('g'), Letter('h'), Letter('i'), Letter('j'), Control(Cancel)],
    [Letter('k'), Letter('l'), Letter('m'), Letter('n'), Letter('o'), Control(Cancel)],
    [Letter('p'), Letter('q'), Letter('r'), Letter('s'), Letter('t'), Control(Cancel)],
    [Letter('u'), Letter('v'), Letter('w'), Letter('x'), Letter('y'), Control(Cancel)],
    [Letter('z'), Control(Yes), Control(No), Control(Delete), Control(Speak), Control(Cancel)],
];

/// Resolve a master/detail pair to a letter or control action.
pub fn msr_key(master: usize, detail: usize) -> Option<MsrKey> {
    MSR_DETAIL_KEYS
        .get(master)
        .and_then(|row| row.get(detail))
        .copied()
}

/// Describes a concrete keyboard layout.
///
/// `key_count` is the number of keys for single-stroke layouts; two-stroke
/// layouts carry the first-stroke sentinel instead. `sectors` overrides the
/// built-in heading table so layouts whose key placement differs from the
/// built-ins can be supplied as configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyboardLayoutDescriptor {
    pub name: String,
    pub key_count: i32,
    pub letter_groups: Vec<String>,
    #[serde(default)]
    pub two_strokes: bool,
    #[serde(default)]
    pub msr: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sectors: Option<SectorTable>,
}

const BUILTIN_LAYOUTS: [&str; 5] = ["four", "six", "eight", "two-stroke", "msr"];

impl KeyboardLayoutDescriptor {
    fn with_groups(name: &str, key_count: i32, groups: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            key_count,
            letter_groups: groups.iter().map(|g| g.to_string()).collect(),
            two_strokes: false,
            msr: false,
            sectors: None,
        }
    }

    /// Four keys: up, right, left, down.
    pub fn four() -> Self {
        Self::with_groups("four", 4, &["abcdef", "ghijklm", "nopqrs", "tuvwxyz"])
    }

    pub fn six() -> Self {
        Self::with_groups("six", 6, &["abcd", "efgh", "ijklm", "nopq", "rstu", "vwxyz"])
    }

    pub fn eight() -> Self {
        Self::with_groups(
            "eight",
            8,
            &["abc", "def", "ghi", "jkl", "mno", "pqrs", "tuv", "wxyz"],
        )
    }

    pub fn two_stroke() -> Self {
        let mut layout = Self::with_groups(
            "two-stroke",
            SectorLayout::TwoStrokeFirst.sector_count(),
            &TWO_STROKE_GROUPS,
        );
        layout.two_strokes = true;
        layout
    }

    /// Two-level master/detail layout on six keys.
    pub fn msr() -> Self {
        let mut layout =
            Self::with_groups("msr", 6, &["abcde", "fghij", "klmno", "pqrst", "uvwxy", "z"]);
        layout.msr = true;
        layout
    }

    /// Look up a built-in layout by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "four" => Some(Self::four()),
            "six" => Some(Self::six()),
            "eight" => Some(Self::eight()),
            "two-stroke" => Some(Self::two_stroke()),
            "msr" => Some(Self::msr()),
            _ => None,
        }
    }

    pub fn builtin_names() -> &'static [&'static str] {
        &BUILTIN_LAYOUTS
    }

    pub fn input_mode(&self) -> InputMode {
        if self.msr {
            InputMode::MasterDetail
        } else if self.two_strokes {
            InputMode::TwoStroke
        } else {
            InputMode::SingleStroke
        }
    }

    /// Whether entered keys name exact letters rather than ambiguous groups.
    ///
    /// Both two-stroke and MSR input resolve a concrete letter per entry.
    pub fn exact_letters(&self) -> bool {
        self.two_strokes || self.msr
    }

    pub fn grouping(&self) -> KeyLetterGrouping {
        KeyLetterGrouping::new(&self.letter_groups, self.exact_letters())
    }

    /// Heading table used to classify a single swipe on this layout.
    ///
    /// For two-stroke layouts this is the first-stroke table; MSR layouts use
    /// it for both levels.
    pub fn sector_table(&self) -> Option<SectorTable> {
        if let Some(table) = &self.sectors {
            return Some(table.clone());
        }
        if self.two_strokes {
            return Some(SectorLayout::TwoStrokeFirst.table());
        }
        SectorLayout::from_sector_count(self.key_count).map(SectorLayout::table)
    }
}

impl Default for KeyboardLayoutDescriptor {
    fn default() -> Self {
        Self::four()
    }
}
