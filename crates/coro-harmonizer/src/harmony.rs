//! Debounced key analysis from held MIDI notes.

use crate::chords::{KeyCenter, detect_key};

/// Key center plus the debounce state that gates re-analysis.
///
/// A note change marks the analyzer pending. The held notes are analyzed
/// once the debounce window has passed without further changes, so a chord
/// played in one note at a time is judged as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarmonyAnalyzer {
    key: KeyCenter,
    pending: bool,
    /// Sample count of the last note change
    changed_at: u64,
    /// Samples that must pass after a change
    debounce: u64,
}

impl Default for HarmonyAnalyzer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl HarmonyAnalyzer {
    /// Analyzer in C major.
    pub fn new(debounce: u64) -> Self {
        Self {
            key: KeyCenter::default(),
            pending: false,
            changed_at: 0,
            debounce,
        }
    }

    /// Sets the debounce window in samples.
    pub fn set_debounce(&mut self, samples: u64) {
        self.debounce = samples;
    }

    /// Debounce window in samples.
    pub fn debounce(&self) -> u64 {
        self.debounce
    }

    /// Current key center.
    pub fn key(&self) -> KeyCenter {
        self.key
    }

    /// Overrides the key center.
    pub fn set_key(&mut self, key: KeyCenter) {
        self.key = key;
    }

    /// True while a note change awaits analysis.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Records a note change at sample `now`.
    pub fn notes_changed(&mut self, now: u64) {
        self.pending = true;
        self.changed_at = now;
    }

    /// Drops any pending analysis.
    pub fn clear_pending(&mut self) {
        self.pending = false;
    }

    /// Re-analyzes `held` once the debounce window has passed.
    ///
    /// Returns the new key when it differs from the current one. With no
    /// triad among the held notes the key is left unchanged.
    pub fn poll(&mut self, now: u64, held: impl Iterator<Item = u8>) -> Option<KeyCenter> {
        if !self.pending || now.saturating_sub(self.changed_at) <= self.debounce {
            return None;
        }
        self.pending = false;

        let mut notes = [0u8; 128];
        let mut count = 0;
        for note in held.take(notes.len()) {
            notes[count] = note;
            count += 1;
        }

        let key = detect_key(&notes[..count])?;
        if key == self.key {
            return None;
        }
        self.key = key;
        Some(key)
    }
}
