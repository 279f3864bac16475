//! Input sequencing: turning classified keys into the entered key sequence.
//!
//! The sequencer owns the key sequence for the word being composed and the
//! small amount of state the multi-gesture modes need:
//!
//! - single-stroke: every key is appended as-is
//! - two-stroke: a pending first stroke waits for the second stroke, and the
//!   pair resolves to one letter
//! - master/detail (MSR): the first gesture opens a group, the second picks a
//!   letter or a control action inside it
//!
//! Every entry point is total. Calls made in the wrong phase, or with keys the
//! active tables do not know, report [`SequencerEvent::Ignored`] and leave the
//! state untouched.
use crate::geometry::{self, SectorLayout, SectorTable, SwipeVector, TWO_STROKE_GROUPS};
use crate::layout::{self, ControlAction, KeyboardLayoutDescriptor, MsrKey};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How key selections are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputMode {
    #[default]
    SingleStroke,
    TwoStroke,
    MasterDetail,
}

/// Level of the master/detail layout the next gesture addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MsrState {
    /// No group chosen yet.
    #[default]
    Master,
    /// A group was chosen; the next gesture picks inside it.
    Detail(usize),
}

/// Observable effect of one sequencer call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerEvent {
    /// The key index was appended to the sequence.
    Appended(usize),
    /// A first stroke is waiting for its second stroke.
    StrokePending(usize),
    /// The MSR detail level for this master key is open.
    DetailOpened(usize),
    /// An MSR control key was chosen. `Delete` has already removed the last
    /// entry when it is reported.
    Control(ControlAction),
    /// Nothing changed.
    Ignored,
}

/// State machine producing the entered key sequence.
#[derive(Debug, Clone, Default)]
pub struct InputSequencer {
    sequence: Vec<usize>,
    mode: InputMode,
    msr_state: MsrState,
    pending_first_stroke: Option<usize>,
    sectors: Option<SectorTable>,
}

impl InputSequencer {
    pub fn new(mode: InputMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Sequencer configured for a layout's mode and heading table.
    pub fn for_layout(layout: &KeyboardLayoutDescriptor) -> Self {
        let mut sequencer = Self::default();
        sequencer.set_layout(layout);
        sequencer
    }

    /// Switch layout; clears all state.
    pub fn set_layout(&mut self, layout: &KeyboardLayoutDescriptor) {
        self.mode = layout.input_mode();
        self.sectors = layout.sector_table();
        self.reset();
    }

    /// Switch mode; clears all state.
    pub fn set_mode(&mut self, mode: InputMode) {
        self.mode = mode;
        self.reset();
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    pub fn msr_state(&self) -> MsrState {
        self.msr_state
    }

    pub fn pending_first_stroke(&self) -> Option<usize> {
        self.pending_first_stroke
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Clear the sequence, any pending stroke and return to the master level.
    pub fn reset(&mut self) {
        self.sequence.clear();
        self.pending_first_stroke = None;
        self.msr_state = MsrState::Master;
    }

    /// Remove the last entered key (backspace).
    pub fn delete_last(&mut self) -> Option<usize> {
        self.sequence.pop()
    }

    /// Append a key in single-stroke mode.
    ///
    /// Out-of-range indices are recorded as-is; the dictionary simply has no
    /// path for them. `is_swipe` only matters for feedback.
    pub fn key_entered(&mut self, index: usize, is_swipe: bool) -> SequencerEvent {
        if self.mode != InputMode::SingleStroke {
            debug!(index, mode = ?self.mode, "key_entered outside single-stroke mode");
            return SequencerEvent::Ignored;
        }
        debug!(index, is_swipe, "key appended");
        self.sequence.push(index);
        SequencerEvent::Appended(index)
    }

    /// Record the first stroke of a two-stroke letter, replacing any earlier
    /// first stroke. Keys that name no letter group are ignored.
    pub fn first_stroke_entered(&mut self, key: usize, is_swipe: bool) -> SequencerEvent {
        if self.mode != InputMode::TwoStroke {
            debug!(key, mode = ?self.mode, "first stroke outside two-stroke mode");
            return SequencerEvent::Ignored;
        }
        if key >= TWO_STROKE_GROUPS.len() {
            debug!(key, is_swipe, "unknown two-stroke group");
            return SequencerEvent::Ignored;
        }
        self.pending_first_stroke = Some(key);
        SequencerEvent::StrokePending(key)
    }

    /// Complete a two-stroke letter.
    ///
    /// Appends exactly one key (the letter's code) and clears the pending
    /// stroke. Without a pending stroke, or when the pair names no letter,
    /// nothing changes.
    pub fn second_stroke_entered(&mut self, key: usize, is_swipe: bool) -> SequencerEvent {
        if self.mode != InputMode::TwoStroke {
            return SequencerEvent::Ignored;
        }
        let Some(first) = self.pending_first_stroke else {
            debug!(key, is_swipe, "second stroke without a first stroke");
            return SequencerEvent::Ignored;
        };
        match geometry::resolve_two_stroke(first, key) {
            Some(letter) => {
                let index = letter as usize;
                self.pending_first_stroke = None;
                self.sequence.push(index);
                SequencerEvent::Appended(index)
            }
            None => {
                debug!(first, key, is_swipe, "two-stroke pair names no letter");
                SequencerEvent::Ignored
            }
        }
    }

    /// Advance the master/detail layout by one gesture.
    pub fn msr_key_entered(&mut self, key: usize, is_swipe: bool) -> SequencerEvent {
        if self.mode != InputMode::MasterDetail {
            return SequencerEvent::Ignored;
        }
        match self.msr_state {
            MsrState::Master => {
                if layout::msr_key(key, 0).is_none() {
                    debug!(key, is_swipe, "unknown MSR master key");
                    return SequencerEvent::Ignored;
                }
                self.msr_state = MsrState::Detail(key);
                SequencerEvent::DetailOpened(key)
            }
            MsrState::Detail(master) => match layout::msr_key(master, key) {
                Some(MsrKey::Letter(letter)) => {
                    let index = letter as usize;
                    self.sequence.push(index);
                    self.msr_state = MsrState::Master;
                    SequencerEvent::Appended(index)
                }
                Some(MsrKey::Control(action)) => {
                    if action == ControlAction::Delete {
                        self.sequence.pop();
                    }
                    self.msr_state = MsrState::Master;
                    SequencerEvent::Control(action)
                }
                None => {
                    debug!(master, key, is_swipe, "unknown MSR detail key");
                    SequencerEvent::Ignored
                }
            },
        }
    }

    /// Route an already-resolved key tap according to the current mode and
    /// phase.
    pub fn tap(&mut self, key: usize) -> SequencerEvent {
        self.dispatch(key, false)
    }

    /// Classify a swipe with the table for the current mode and phase, then
    /// route it like a tap.
    pub fn swipe(&mut self, vector: SwipeVector) -> SequencerEvent {
        let key = match self.mode {
            InputMode::SingleStroke | InputMode::MasterDetail => self
                .sectors
                .as_ref()
                .and_then(|table| table.classify(vector)),
            InputMode::TwoStroke => match self.pending_first_stroke {
                None => geometry::classify(vector, SectorLayout::TwoStrokeFirst),
                Some(first) => geometry::classify(vector, geometry::second_stroke_layout(first)),
            },
        };
        match key {
            Some(key) => self.dispatch(key, true),
            None => SequencerEvent::Ignored,
        }
    }

    fn dispatch(&mut self, key: usize, is_swipe: bool) -> SequencerEvent {
        match self.mode {
            InputMode::SingleStroke => self.key_entered(key, is_swipe),
            InputMode::TwoStroke if self.pending_first_stroke.is_some() => {
                self.second_stroke_entered(key, is_swipe)
            }
            InputMode::TwoStroke => self.first_stroke_entered(key, is_swipe),
            InputMode::MasterDetail => self.msr_key_entered(key, is_swipe),
        }
    }
}
