//! Swipe geometry: turning a gesture delta into a key index.
//!
//! Screen convention is "y grows downward", so `atan2(dy, dx)` measures angles
//! clockwise from the positive x-axis. A [`SectorTable`] splits the circle into
//! equally spaced headings and maps each heading to a key index through an
//! explicit table. Key indices follow the on-screen arrangement of the key
//! labels, not the clockwise order of the headings, so the tables are data and
//! are never derived by rotation.
//!
//! Heading angles used by the built-in tables:
//!
//! | angle | heading    |
//! |-------|------------|
//! | 0°    | right      |
//! | 90°   | down       |
//! | 180°  | left       |
//! | 270°  | up         |
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A swipe delta in screen coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SwipeVector {
    pub dx: f64,
    pub dy: f64,
}

impl SwipeVector {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    pub fn length(&self) -> f64 {
        self.dx.hypot(self.dy)
    }

    /// Zero-length (or non-finite) vectors carry no direction.
    pub fn is_degenerate(&self) -> bool {
        !self.dx.is_finite() || !self.dy.is_finite() || self.length() == 0.0
    }

    /// Angle in degrees, clockwise from the positive x-axis, in `[0, 360)`.
    ///
    /// Returns `None` for degenerate vectors.
    pub fn angle_degrees(&self) -> Option<f64> {
        if self.is_degenerate() {
            return None;
        }
        let angle = self.dy.atan2(self.dx).to_degrees().rem_euclid(360.0);
        // rem_euclid can round up to exactly 360.0 for tiny negative angles
        Some(if angle >= 360.0 { 0.0 } else { angle })
    }
}

/// Coarse four-way direction used for on-screen indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Pick the dominant axis, then the sign along it.
///
/// Ties go to the vertical axis. A zero vector reports `Down`.
pub fn direction(vector: SwipeVector) -> Direction {
    if vector.dx.abs() > vector.dy.abs() {
        if vector.dx < 0.0 {
            Direction::Left
        } else {
            Direction::Right
        }
    } else if vector.dy < 0.0 {
        Direction::Up
    } else {
        Direction::Down
    }
}

/// Heading-to-key lookup table for one classifier variant.
///
/// `keys[h]` is the key index for heading `h`; heading 0 sits at
/// `offset_degrees` and the remaining headings follow clockwise, spaced
/// `360 / keys.len()` degrees apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorTable {
    pub offset_degrees: f64,
    pub keys: Cow<'static, [usize]>,
}

impl SectorTable {
    /// Build a table from configuration data.
    pub fn new(offset_degrees: f64, keys: Vec<usize>) -> Self {
        Self {
            offset_degrees,
            keys: Cow::Owned(keys),
        }
    }

    pub fn sector_count(&self) -> usize {
        self.keys.len()
    }

    /// Index of the heading nearest to `vector`.
    pub fn heading_for(&self, vector: SwipeVector) -> Option<usize> {
        let count = self.keys.len();
        if count == 0 {
            return None;
        }
        let angle = vector.angle_degrees()?;
        let width = 360.0 / count as f64;
        let relative = (angle - self.offset_degrees).rem_euclid(360.0);
        let heading = ((relative + width / 2.0) / width).floor() as usize;
        Some(heading % count)
    }

    /// Classify a swipe into a key index.
    ///
    /// Degenerate vectors and empty tables yield `None`.
    pub fn classify(&self, vector: SwipeVector) -> Option<usize> {
        self.heading_for(vector).map(|h| self.keys[h])
    }
}

// Headings clockwise from right: right, down, left, up.
// Keys: up = 0, right = 1, left = 2, down = 3.
const FOUR_KEYS: SectorTable = SectorTable {
    offset_degrees: 0.0,
    keys: Cow::Borrowed(&[1, 3, 2, 0]),
};

// Headings clockwise from 30°: down-right, down, down-left, up-left, up, up-right.
// Keys in reading order: up-left, up, up-right / down-left, down, down-right.
const SIX_KEYS: SectorTable = SectorTable {
    offset_degrees: 30.0,
    keys: Cow::Borrowed(&[5, 4, 3, 0, 1, 2]),
};

// Headings clockwise from right in 45° steps.
// Keys in reading order around an empty centre: up-left, up, up-right,
// left, right, down-left, down, down-right.
const EIGHT_KEYS: SectorTable = SectorTable {
    offset_degrees: 0.0,
    keys: Cow::Borrowed(&[4, 7, 6, 5, 3, 0, 1, 2]),
};

// Two-stroke family, same headings as SIX_KEYS.
// up-right = 0, up = 1, up-left = 2, down-right = 3, down = 4, down-left = 5.
const TWO_STROKE_KEYS: SectorTable = SectorTable {
    offset_degrees: 30.0,
    keys: Cow::Borrowed(&[3, 4, 5, 2, 1, 0]),
};

// Second stroke for the two-letter tail group: left = 0 (y), right = 1 (z).
const TWO_STROKE_TAIL_KEYS: SectorTable = SectorTable {
    offset_degrees: 0.0,
    keys: Cow::Borrowed(&[1, 0]),
};

/// Letter groups selected by the first stroke of the two-stroke layout.
///
/// The second stroke picks the letter at that position within the group.
pub const TWO_STROKE_GROUPS: [&str; 6] = ["abcde", "fghij", "klmno", "pqrst", "uvwx", "yz"];

/// Named classifier variants.
///
/// Positive sector counts select single-stroke tables. The negative sentinels
/// used by two-stroke layouts select per-stroke tables and are not arithmetic
/// counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectorLayout {
    Four,
    Six,
    Eight,
    TwoStrokeFirst,
    TwoStrokeSecond,
    /// Second stroke for the group holding only the last two letters.
    TwoStrokeSecondTail,
}

impl SectorLayout {
    pub fn from_sector_count(count: i32) -> Option<Self> {
        match count {
            4 => Some(Self::Four),
            6 => Some(Self::Six),
            8 => Some(Self::Eight),
            -1 => Some(Self::TwoStrokeFirst),
            -2 => Some(Self::TwoStrokeSecond),
            -3 => Some(Self::TwoStrokeSecondTail),
            _ => None,
        }
    }

    /// The sector count (or sentinel) this variant is addressed by.
    pub fn sector_count(self) -> i32 {
        match self {
            Self::Four => 4,
            Self::Six => 6,
            Self::Eight => 8,
            Self::TwoStrokeFirst => -1,
            Self::TwoStrokeSecond => -2,
            Self::TwoStrokeSecondTail => -3,
        }
    }

    pub fn table(self) -> SectorTable {
        match self {
            Self::Four => FOUR_KEYS,
            Self::Six => SIX_KEYS,
            Self::Eight => EIGHT_KEYS,
            Self::TwoStrokeFirst | Self::TwoStrokeSecond => TWO_STROKE_KEYS,
            Self::TwoStrokeSecondTail => TWO_STROKE_TAIL_KEYS,
        }
    }
}

/// Classify `vector` with the built-in table for `layout`.
pub fn classify(vector: SwipeVector, layout: SectorLayout) -> Option<usize> {
    layout.table().classify(vector)
}

/// Classify using a raw sector count or sentinel; unknown counts yield `None`.
pub fn classify_with_count(vector: SwipeVector, sector_count: i32) -> Option<usize> {
    SectorLayout::from_sector_count(sector_count).and_then(|layout| classify(vector, layout))
}

/// Table to use for the second stroke after `first` was chosen.
pub fn second_stroke_layout(first: usize) -> SectorLayout {
    match TWO_STROKE_GROUPS.get(first) {
        Some(group) if group.len() == 2 => SectorLayout::TwoStrokeSecondTail,
        _ => SectorLayout::TwoStrokeSecond,
    }
}

/// Resolve a two-stroke pair to a letter.
///
/// `None` when either stroke does not address a letter.
pub fn resolve_two_stroke(first: usize, second: usize) -> Option<char> {
    TWO_STROKE_GROUPS
        .get(first)
        .and_then(|group| group.chars().nth(second))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(dx: f64, dy: f64) -> SwipeVector {
        SwipeVector::new(dx, dy)
    }

    #[test]
    fn test_four_key_cardinals() {
        assert_eq!(classify(v(100.0, 0.0), SectorLayout::Four), Some(1));
        assert_eq!(classify(v(0.0, 100.0), SectorLayout::Four), Some(3));
        assert_eq!(classify(v(-100.0, 0.0), SectorLayout::Four), Some(2));
        assert_eq!(classify(v(0.0, -100.0), SectorLayout::Four), Some(0));
    }

    #[test]
    fn test_four_key_tolerates_off_axis_swipes() {
        assert_eq!(classify(v(100.0, 30.0), SectorLayout::Four), Some(1));
        assert_eq!(classify(v(100.0, -30.0), SectorLayout::Four), Some(1));
        assert_eq!(classify(v(-20.0, -90.0), SectorLayout::Four), Some(0));
        assert_eq!(classify(v(25.0, 80.0), SectorLayout::Four), Some(3));
    }

    #[test]
    fn test_classification_is_deterministic() {
        for layout in [
            SectorLayout::Four,
            SectorLayout::Six,
            SectorLayout::Eight,
            SectorLayout::TwoStrokeFirst,
            SectorLayout::TwoStrokeSecondTail,
        ] {
            let a = classify(v(37.0, -81.0), layout);
            let b = classify(v(37.0, -81.0), layout);
            assert_eq!(a, b);
            assert!(a.is_some());
        }
    }

    #[test]
    fn test_two_stroke_headings() {
        let layout = SectorLayout::TwoStrokeFirst;
        assert_eq!(classify(v(100.0, -100.0), layout), Some(0)); // up-right
        assert_eq!(classify(v(0.0, -100.0), layout), Some(1)); // up
        assert_eq!(classify(v(-100.0, -100.0), layout), Some(2)); // up-left
        assert_eq!(classify(v(100.0, 100.0), layout), Some(3)); // down-right
        assert_eq!(classify(v(0.0, 100.0), layout), Some(4)); // down
        assert_eq!(classify(v(-100.0, 100.0), layout), Some(5)); // down-left
    }

    #[test]
    fn test_eight_key_reading_order() {
        let layout = SectorLayout::Eight;
        assert_eq!(classify(v(-100.0, -100.0), layout), Some(0));
        assert_eq!(classify(v(0.0, -100.0), layout), Some(1));
        assert_eq!(classify(v(100.0, -100.0), layout), Some(2));
        assert_eq!(classify(v(-100.0, 0.0), layout), Some(3));
        assert_eq!(classify(v(100.0, 0.0), layout), Some(4));
        assert_eq!(classify(v(-100.0, 100.0), layout), Some(5));
        assert_eq!(classify(v(0.0, 100.0), layout), Some(6));
        assert_eq!(classify(v(100.0, 100.0), layout), Some(7));
    }

    #[test]
    fn test_six_key_reading_order() {
        let layout = SectorLayout::Six;
        assert_eq!(classify(v(-100.0, -100.0), layout), Some(0));
        assert_eq!(classify(v(0.0, -100.0), layout), Some(1));
        assert_eq!(classify(v(100.0, -100.0), layout), Some(2));
        assert_eq!(classify(v(-100.0, 100.0), layout), Some(3));
        assert_eq!(classify(v(0.0, 100.0), layout), Some(4));
        assert_eq!(classify(v(100.0, 100.0), layout), Some(5));
    }

    #[test]
    fn test_tail_variant_only_has_two_keys() {
        let layout = SectorLayout::TwoStrokeSecondTail;
        assert_eq!(classify(v(-100.0, 10.0), layout), Some(0));
        assert_eq!(classify(v(100.0, 10.0), layout), Some(1));
    }

    #[test]
    fn test_degenerate_vector_is_rejected() {
        assert_eq!(classify(v(0.0, 0.0), SectorLayout::Four), None);
        assert_eq!(classify(v(f64::NAN, 1.0), SectorLayout::Four), None);
    }

    #[test]
    fn test_sentinels_map_to_named_variants() {
        assert_eq!(
            SectorLayout::from_sector_count(-1),
            Some(SectorLayout::TwoStrokeFirst)
        );
        assert_eq!(
            SectorLayout::from_sector_count(-3),
            Some(SectorLayout::TwoStrokeSecondTail)
        );
        assert_eq!(SectorLayout::from_sector_count(5), None);
        assert_eq!(classify_with_count(v(100.0, 0.0), 4), Some(1));
        assert_eq!(classify_with_count(v(100.0, 0.0), 7), None);
        for count in [4, 6, 8, -1, -2, -3] {
            let layout = SectorLayout::from_sector_count(count).unwrap();
            assert_eq!(layout.sector_count(), count);
        }
    }

    #[test]
    fn test_custom_table() {
        // Two keys split into top and bottom halves.
        let table = SectorTable::new(90.0, vec![7, 3]);
        assert_eq!(table.sector_count(), 2);
        assert_eq!(table.classify(v(5.0, 100.0)), Some(7));
        assert_eq!(table.classify(v(5.0, -100.0)), Some(3));
        assert_eq!(SectorTable::new(0.0, vec![]).classify(v(1.0, 0.0)), None);
    }

    #[test]
    fn test_direction() {
        assert_eq!(direction(v(100.0, 10.0)), Direction::Right);
        assert_eq!(direction(v(-100.0, 10.0)), Direction::Left);
        assert_eq!(direction(v(10.0, -100.0)), Direction::Up);
        assert_eq!(direction(v(10.0, 100.0)), Direction::Down);
    }

    #[test]
    fn test_two_stroke_resolution() {
        assert_eq!(resolve_two_stroke(0, 0), Some('a'));
        assert_eq!(resolve_two_stroke(2, 3), Some('n'));
        assert_eq!(resolve_two_stroke(5, 1), Some('z'));
        assert_eq!(resolve_two_stroke(4, 5), None);
        assert_eq!(resolve_two_stroke(9, 0), None);
        assert_eq!(second_stroke_layout(5), SectorLayout::TwoStrokeSecondTail);
        assert_eq!(second_stroke_layout(1), SectorLayout::TwoStrokeSecond);
    }
}
