//! Chord tables, triads and key centers.
//!
//! A chord table maps each scale degree of a key to four ratios, one per
//! automatic voice slot: the lead (always unison), two chord tones and the
//! octave. Tables exist for three qualities and are editable through the
//! parameter address space, one semitone count per entry.

use coro_core::{ratio_to_semitones, semitones_to_ratio};

/// Scale degrees per table.
pub const DEGREES: usize = 12;

/// Ratios per table row.
pub const ROW_LEN: usize = 4;

/// Largest interval, in semitones, a table entry can hold.
pub const MAX_ENTRY_SEMITONES: i32 = 23;

/// Number of selectable triads.
pub const TRIAD_COUNT: usize = 18;

/// Chord quality of a key center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChordQuality {
    /// Major scale harmony
    #[default]
    Major,
    /// Natural minor harmony
    Minor,
    /// Blues harmony
    Blues,
}

impl ChordQuality {
    /// All qualities in address order.
    pub const ALL: [ChordQuality; 3] = [Self::Major, Self::Minor, Self::Blues];

    /// Position in the address space.
    pub const fn index(self) -> usize {
        match self {
            Self::Major => 0,
            Self::Minor => 1,
            Self::Blues => 2,
        }
    }

    /// Quality at an address-space position.
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Major),
            1 => Some(Self::Minor),
            2 => Some(Self::Blues),
            _ => None,
        }
    }

    /// Lowercase name used in session files.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Blues => "blues",
        }
    }

    /// Parses a lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.name() == name)
    }
}

/// Root and quality of the current key.
///
/// Encoded in the parameter address space as `quality * 12 + root`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyCenter {
    /// Pitch class of the root, `0..12` with 0 = C
    pub root: u8,
    /// Table used for harmony lookup
    pub quality: ChordQuality,
}

impl KeyCenter {
    /// Highest valid encoded key center.
    pub const MAX_INDEX: u8 = 35;

    /// Creates a key center; the root is folded into one octave.
    pub const fn new(root: u8, quality: ChordQuality) -> Self {
        Self {
            root: root % 12,
            quality,
        }
    }

    /// Decodes `quality * 12 + root`, clamping out-of-range indices.
    pub fn from_index(index: u8) -> Self {
        let index = index.min(Self::MAX_INDEX);
        let quality = ChordQuality::from_index(usize::from(index / 12)).unwrap_or_default();
        Self::new(index % 12, quality)
    }

    /// Encoded form.
    pub fn index(&self) -> u8 {
        self.quality.index() as u8 * 12 + self.root
    }
}

/// Two-tone chord shapes, in semitones above the sung note.
const MAJ_R: (i8, i8) = (4, 7);
const MAJ_1: (i8, i8) = (5, 9);
const MAJ_2: (i8, i8) = (3, 8);
const MIN_R: (i8, i8) = (3, 7);
const MIN_1: (i8, i8) = (5, 8);
const MIN_2: (i8, i8) = (4, 9);
const DIM_R: (i8, i8) = (3, 6);
const DIM_1: (i8, i8) = (6, 9);
const DIM_2: (i8, i8) = (3, 9);
const SUS4_R: (i8, i8) = (5, 7);
const SUS4_1: (i8, i8) = (2, 7);
const SUS4_2: (i8, i8) = (5, 10);
const AUG: (i8, i8) = (4, 8);

const MAJOR_DEGREES: [(i8, i8); DEGREES] = [
    MAJ_R, DIM_R, MIN_R, DIM_R, MAJ_2, MAJ_R, DIM_R, MAJ_1, AUG, MIN_R, MAJ_R, DIM_R,
];

const MINOR_DEGREES: [(i8, i8); DEGREES] = [
    MIN_R, DIM_R, DIM_R, MIN_2, DIM_R, DIM_2, (6, 8), MIN_1, MAJ_R, DIM_R, MAJ_R, DIM_R,
];

const BLUES_DEGREES: [(i8, i8); DEGREES] = [
    (4, 10), DIM_2, (2, 8), MAJ_R, DIM_R, MAJ_R, MAJ_R, (3, 5), MAJ_R, MAJ_R, (2, 6), MAJ_R,
];

/// Default semitone count of one table entry.
pub const fn default_entry(quality: ChordQuality, degree: usize, voice: usize) -> i8 {
    let shapes = match quality {
        ChordQuality::Major => &MAJOR_DEGREES,
        ChordQuality::Minor => &MINOR_DEGREES,
        ChordQuality::Blues => &BLUES_DEGREES,
    };
    let (low, high) = shapes[degree % DEGREES];
    match voice {
        0 => 0,
        1 => low,
        2 => high,
        _ => 12,
    }
}

/// A selectable triad: names and the ratios of harmony slots 1 and 2.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triad {
    /// Display name
    pub name: &'static str,
    /// Ratio of the first harmony voice
    pub upper: f32,
    /// Ratio of the second harmony voice
    pub lower: f32,
}

const TRIAD_SHAPES: [(&str, (i8, i8)); TRIAD_COUNT - 2] = [
    ("Major", MAJ_R),
    ("Major 1st inv", MAJ_1),
    ("Major 2nd inv", MAJ_2),
    ("Minor", MIN_R),
    ("Minor 1st inv", MIN_1),
    ("Minor 2nd inv", MIN_2),
    ("Diminished", DIM_R),
    ("Diminished 1st inv", DIM_1),
    ("Diminished 2nd inv", DIM_2),
    ("Sus4", SUS4_R),
    ("Sus4 1st inv", SUS4_1),
    ("Sus4 2nd inv", SUS4_2),
    ("Sus2", (2, 7)),
    ("Sus2 1st inv", (5, 10)),
    ("Sus2 2nd inv", (5, 7)),
    ("Augmented", AUG),
];

/// Triad at `index`, if it exists.
///
/// # Example
///
/// ```rust
/// use coro_harmonizer::chords::triad;
///
/// let fifth = triad(16).unwrap();
/// assert_eq!((fifth.upper, fifth.lower), (1.5, 2.0));
/// assert!(triad(18).is_none());
/// ```
pub fn triad(index: usize) -> Option<Triad> {
    match index {
        16 => Some(Triad {
            name: "Fifth",
            upper: 1.5,
            lower: 2.0,
        }),
        17 => Some(Triad {
            name: "Octave",
            upper: 0.5,
            lower: 2.0,
        }),
        _ => TRIAD_SHAPES.get(index).map(|&(name, (a, b))| Triad {
            name,
            upper: semitones_to_ratio(f32::from(a)),
            lower: semitones_to_ratio(f32::from(b)),
        }),
    }
}

/// Editable chord tables for all qualities, stored as ratios.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordTables {
    rows: [[[f32; ROW_LEN]; DEGREES]; 3],
}

impl Default for ChordTables {
    fn default() -> Self {
        let mut rows = [[[1.0; ROW_LEN]; DEGREES]; 3];
        for quality in ChordQuality::ALL {
            for (degree, row) in rows[quality.index()].iter_mut().enumerate() {
                for (voice, ratio) in row.iter_mut().enumerate() {
                    *ratio = semitones_to_ratio(f32::from(default_entry(quality, degree, voice)));
                }
            }
        }
        Self { rows }
    }
}

impl ChordTables {
    /// Row for a scale degree (folded into one octave).
    pub fn row(&self, quality: ChordQuality, degree: usize) -> &[f32; ROW_LEN] {
        &self.rows[quality.index()][degree % DEGREES]
    }

    /// Ratio of one entry.
    pub fn ratio(&self, quality: ChordQuality, degree: usize, voice: usize) -> f32 {
        self.row(quality, degree)[voice % ROW_LEN]
    }

    /// Row with every voice above `inversion` dropped an octave.
    ///
    /// # Example
    ///
    /// ```rust
    /// use coro_harmonizer::chords::{ChordQuality, ChordTables};
    ///
    /// let tables = ChordTables::default();
    /// let voicing = tables.voicing(ChordQuality::Major, 0, 2);
    /// assert_eq!(voicing[0], 1.0);
    /// assert_eq!(voicing[3], 1.0); // octave dropped to unison
    /// ```
    pub fn voicing(&self, quality: ChordQuality, degree: usize, inversion: usize) -> [f32; ROW_LEN] {
        let mut row = *self.row(quality, degree);
        for (voice, ratio) in row.iter_mut().enumerate() {
            if voice > inversion {
                *ratio *= 0.5;
            }
        }
        row
    }

    /// Stores an entry as `2^(semitones / 12)`, clamping to ±23 semitones.
    pub fn set_semitones(&mut self, quality: ChordQuality, degree: usize, voice: usize, semitones: i32) {
        let semitones = semitones.clamp(-MAX_ENTRY_SEMITONES, MAX_ENTRY_SEMITONES);
        self.rows[quality.index()][degree % DEGREES][voice % ROW_LEN] =
            semitones_to_ratio(semitones as f32);
    }

    /// Entry rounded back to whole semitones.
    pub fn semitones(&self, quality: ChordQuality, degree: usize, voice: usize) -> i32 {
        ratio_to_semitones(self.ratio(quality, degree, voice)).round() as i32
    }
}

/// Detects a key from held MIDI notes.
///
/// Notes are visited from lowest to highest, skipping pitch classes already
/// seen. The first note that roots a minor triad among the held pitch
/// classes wins, then a major triad; minor is tested first on each note.
/// Returns `None` when no triad is present.
///
/// # Example
///
/// ```rust
/// use coro_harmonizer::chords::{ChordQuality, KeyCenter, detect_key};
///
/// assert_eq!(detect_key(&[67, 60, 64]), Some(KeyCenter::new(0, ChordQuality::Major)));
/// assert_eq!(detect_key(&[57, 60, 64]), Some(KeyCenter::new(9, ChordQuality::Minor)));
/// assert_eq!(detect_key(&[60, 62]), None);
/// ```
pub fn detect_key(notes: &[u8]) -> Option<KeyCenter> {
    let mut sorted = [0u8; 128];
    let count = notes.len().min(sorted.len());
    sorted[..count].copy_from_slice(&notes[..count]);
    let sorted = &mut sorted[..count];
    sorted.sort_unstable();

    let mut held = [false; 12];
    for &note in sorted.iter() {
        held[usize::from(note % 12)] = true;
    }

    let mut seen = [false; 12];
    for &note in sorted.iter() {
        let root = usize::from(note % 12);
        if seen[root] {
            continue;
        }
        seen[root] = true;

        let has = |interval: usize| held[(root + interval) % 12];
        if has(3) && has(7) {
            return Some(KeyCenter::new(root as u8, ChordQuality::Minor));
        }
        if has(4) && has(7) {
            return Some(KeyCenter::new(root as u8, ChordQuality::Major));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rows_shape() {
        let tables = ChordTables::default();
        for quality in ChordQuality::ALL {
            for degree in 0..DEGREES {
                let row = tables.row(quality, degree);
                assert_eq!(row[0], 1.0);
                assert_eq!(row[3], 2.0);
                assert!(row[1] > 1.0 && row[2] > row[1]);
            }
        }
    }

    #[test]
    fn test_major_tonic_is_major_triad() {
        let tables = ChordTables::default();
        assert_eq!(tables.semitones(ChordQuality::Major, 0, 1), 4);
        assert_eq!(tables.semitones(ChordQuality::Major, 0, 2), 7);
        assert_eq!(tables.semitones(ChordQuality::Minor, 6, 1), 6);
        assert_eq!(tables.semitones(ChordQuality::Blues, 7, 2), 5);
    }

    #[test]
    fn test_set_semitones_clamps() {
        let mut tables = ChordTables::default();
        tables.set_semitones(ChordQuality::Blues, 3, 1, 40);
        assert_eq!(tables.semitones(ChordQuality::Blues, 3, 1), 23);
        tables.set_semitones(ChordQuality::Blues, 3, 1, -5);
        assert_eq!(tables.semitones(ChordQuality::Blues, 3, 1), -5);
    }

    #[test]
    fn test_voicing_inversion() {
        let tables = ChordTables::default();
        let full = tables.voicing(ChordQuality::Major, 0, 3);
        assert_eq!(full, *tables.row(ChordQuality::Major, 0));
        let low = tables.voicing(ChordQuality::Major, 0, 0);
        assert_eq!(low[0], 1.0);
        assert_eq!(low[1], tables.ratio(ChordQuality::Major, 0, 1) * 0.5);
    }

    #[test]
    fn test_key_center_encoding() {
        let key = KeyCenter::from_index(21);
        assert_eq!(key, KeyCenter::new(9, ChordQuality::Minor));
        assert_eq!(key.index(), 21);
        assert_eq!(KeyCenter::from_index(200).index(), 35);
    }

    #[test]
    fn test_triads() {
        assert_eq!(triad(0).map(|t| t.name), Some("Major"));
        let sus2 = triad(12).unwrap();
        assert!((sus2.upper - semitones_to_ratio(2.0)).abs() < 1e-7);
        let octave = triad(17).unwrap();
        assert_eq!((octave.upper, octave.lower), (0.5, 2.0));
        assert!(triad(TRIAD_COUNT).is_none());
    }

    #[test]
    fn test_detect_key_prefers_minor() {
        // A C E G: A minor is rooted on the lowest note
        assert_eq!(
            detect_key(&[57, 60, 64, 67]),
            Some(KeyCenter::new(9, ChordQuality::Minor))
        );
        // Octave doubles do not matter
        assert_eq!(
            detect_key(&[50, 62, 66, 69, 74]),
            Some(KeyCenter::new(2, ChordQuality::Major))
        );
        assert_eq!(detect_key(&[]), None);
    }
}
