//! Voice slots and MIDI note allocation.
//!
//! Slot layout of a [`VoiceBank`]:
//!
//! | Slots | Role | Assigned by |
//! |-------|------|-------------|
//! | 0 | Lead | always |
//! | 1..first_midi | Harmony | each harmony update |
//! | first_midi..N | MIDI | note-on / note-off |
//!
//! Only MIDI slots take part in note allocation. A note already sounding
//! keeps its slot; otherwise the free slot whose last note was closest to
//! the new one is chosen, and with no free slot the sounding note closest
//! to the new one is stolen. Ties go to the lowest slot.

use coro_core::SmoothedParam;

use crate::tuning::{HARMONY_VELOCITY, INITIAL_GRAIN_COUNTDOWN, RATIO_SMOOTHING};

/// Pan and formant ratio of the harmony slots, in slot order.
const HARMONY_LAYOUT: [(f32, f32); 3] = [(0.5, 0.99), (-0.5, 1.01), (-0.5, 1.0)];

/// What a slot is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assignment {
    /// Silent
    #[default]
    Free,
    /// Claimed by the lead or by automatic harmony
    Auto,
    /// Playing a MIDI note
    Note(u8),
}

/// Role of a slot, fixed by its index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceRole {
    /// The input voice
    Lead,
    /// Automatic or triad harmony
    Harmony,
    /// Driven by MIDI notes
    Midi,
}

/// One output line: a transposition ratio plus grain scheduling state.
#[derive(Debug, Clone, PartialEq)]
pub struct Voice {
    assignment: Assignment,
    velocity: u8,
    /// Note held before the slot was last freed or stolen
    last_note: u8,
    ratio: SmoothedParam,
    formant_ratio: f32,
    pan: f32,
    /// Samples until the next grain
    next_grain: f32,
    /// Sample count at the last assignment
    assigned_at: u64,
}

impl Voice {
    /// Free voice at unity ratio.
    pub fn new(pan: f32, formant_ratio: f32) -> Self {
        Self {
            assignment: Assignment::Free,
            velocity: 0,
            last_note: 0,
            ratio: SmoothedParam::with_coeff(1.0, RATIO_SMOOTHING),
            formant_ratio,
            pan,
            next_grain: INITIAL_GRAIN_COUNTDOWN,
            assigned_at: 0,
        }
    }

    /// Current assignment.
    pub fn assignment(&self) -> Assignment {
        self.assignment
    }

    /// True when the slot is silent.
    pub fn is_free(&self) -> bool {
        self.assignment == Assignment::Free
    }

    /// MIDI note held by this slot.
    pub fn note(&self) -> Option<u8> {
        match self.assignment {
            Assignment::Note(note) => Some(note),
            _ => None,
        }
    }

    /// MIDI velocity, `0..=127`.
    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Note held before the slot was last released.
    pub fn last_note(&self) -> u8 {
        self.last_note
    }

    /// Smoothed transposition ratio.
    pub fn ratio(&self) -> f32 {
        self.ratio.get()
    }

    /// Ratio the smoothing is heading for.
    pub fn target_ratio(&self) -> f32 {
        self.ratio.target()
    }

    /// Grain playback rate while voiced.
    pub fn formant_ratio(&self) -> f32 {
        self.formant_ratio
    }

    /// Pan position, `+1` left to `-1` right.
    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Samples until the next grain (negative once overdue).
    pub fn next_grain(&self) -> f32 {
        self.next_grain
    }

    /// Sample count when the slot was last assigned.
    pub fn assigned_at(&self) -> u64 {
        self.assigned_at
    }

    /// Claims the slot for the lead or automatic harmony.
    pub fn claim(&mut self) {
        self.assignment = Assignment::Auto;
    }

    /// Releases the slot.
    pub fn release(&mut self) {
        if let Some(note) = self.note() {
            self.last_note = note;
        }
        self.assignment = Assignment::Free;
    }

    /// Sets the ratio to smooth toward.
    pub fn set_target_ratio(&mut self, ratio: f32) {
        self.ratio.set_target(ratio);
    }

    /// Jumps to `ratio` without smoothing.
    pub fn snap_ratio(&mut self, ratio: f32) {
        self.ratio.set_immediate(ratio);
    }

    /// One smoothing step.
    pub fn advance_ratio(&mut self) -> f32 {
        self.ratio.advance()
    }

    /// Counts down one sample; true when a grain is due.
    #[inline]
    pub fn tick(&mut self) -> bool {
        self.next_grain -= 1.0;
        self.next_grain < 0.0
    }

    /// Schedules the next grain `samples` after the current one.
    #[inline]
    pub fn rearm(&mut self, samples: f32) {
        self.next_grain += samples;
    }

    fn assign(&mut self, note: u8, velocity: u8, now: u64) {
        if let Some(held) = self.note() {
            self.last_note = held;
        }
        self.assignment = Assignment::Note(note);
        self.velocity = velocity;
        self.assigned_at = now;
        self.next_grain = 0.0;
    }
}

/// Fixed bank of `N` voice slots.
///
/// # Example
///
/// ```rust
/// use coro_harmonizer::VoiceBank;
///
/// let mut bank = VoiceBank::<8>::new(4);
/// assert_eq!(bank.note_on(60, 100, 0), 4);
/// assert_eq!(bank.note_on(64, 100, 1), 5);
/// assert_eq!(bank.held_notes().collect::<Vec<_>>(), vec![60, 64]);
///
/// bank.note_off(60);
/// // The freed slot remembers 60, so 61 goes back to it
/// assert_eq!(bank.note_on(61, 100, 2), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceBank<const N: usize> {
    voices: [Voice; N],
    first_midi: usize,
}

impl<const N: usize> VoiceBank<N> {
    /// Creates a bank whose MIDI slots start at `first_midi`.
    ///
    /// # Panics
    ///
    /// Panics unless `1 <= first_midi < N`.
    pub fn new(first_midi: usize) -> Self {
        assert!(first_midi >= 1 && first_midi < N, "Invalid MIDI slot range");
        let mut bank = Self {
            voices: core::array::from_fn(|_| Voice::new(0.0, 1.0)),
            first_midi,
        };
        bank.reset();
        bank
    }

    /// Role of slot `index`.
    pub fn role(&self, index: usize) -> VoiceRole {
        if index == 0 {
            VoiceRole::Lead
        } else if index < self.first_midi {
            VoiceRole::Harmony
        } else {
            VoiceRole::Midi
        }
    }

    /// First MIDI slot.
    pub fn first_midi(&self) -> usize {
        self.first_midi
    }

    /// All slots.
    pub fn voices(&self) -> &[Voice; N] {
        &self.voices
    }

    /// Mutable access to one slot.
    pub fn voice_mut(&mut self, index: usize) -> &mut Voice {
        &mut self.voices[index]
    }

    /// Notes held by MIDI slots, in slot order.
    pub fn held_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.voices[self.first_midi..].iter().filter_map(Voice::note)
    }

    /// Assigns `note` to a MIDI slot and returns the slot index.
    pub fn note_on(&mut self, note: u8, velocity: u8, now: u64) -> usize {
        let index = self.choose_slot(note);
        self.voices[index].assign(note, velocity, now);
        index
    }

    /// Frees every MIDI slot holding `note`. Returns true if one was found.
    pub fn note_off(&mut self, note: u8) -> bool {
        let mut found = false;
        for voice in &mut self.voices[self.first_midi..] {
            if voice.note() == Some(note) {
                voice.release();
                found = true;
            }
        }
        found
    }

    /// Frees every MIDI slot.
    pub fn all_notes_off(&mut self) {
        for voice in &mut self.voices[self.first_midi..] {
            voice.release();
        }
    }

    /// Frees the harmony slots and claims the lead at unity target.
    ///
    /// Run at the start of every harmony update.
    pub fn begin_update(&mut self) {
        let lead = &mut self.voices[0];
        lead.claim();
        lead.velocity = 127;
        lead.formant_ratio = 1.0;
        lead.set_target_ratio(1.0);

        for (offset, voice) in self.voices[1..self.first_midi].iter_mut().enumerate() {
            let (pan, _) = HARMONY_LAYOUT.get(offset).copied().unwrap_or((0.0, 1.0));
            voice.release();
            voice.velocity = HARMONY_VELOCITY;
            voice.pan = pan;
            voice.set_target_ratio(1.0);
        }
    }

    /// Restores every slot to its initial state.
    pub fn reset(&mut self) {
        let midi_count = (N - self.first_midi) as f32;
        for (index, voice) in self.voices.iter_mut().enumerate() {
            *voice = if index == 0 {
                let mut lead = Voice::new(0.0, 1.0);
                lead.claim();
                lead.velocity = 127;
                lead
            } else if index < self.first_midi {
                let (pan, formant) = HARMONY_LAYOUT.get(index - 1).copied().unwrap_or((0.0, 1.0));
                let mut harmony = Voice::new(pan, formant);
                harmony.velocity = HARMONY_VELOCITY;
                harmony
            } else {
                let spread = (index - self.first_midi) as f32 / midi_count - 0.5;
                Voice::new(spread, 1.0)
            };
        }
    }

    fn choose_slot(&self, note: u8) -> usize {
        let midi = self.first_midi..N;

        if let Some(index) = midi.clone().find(|&i| self.voices[i].note() == Some(note)) {
            return index;
        }

        let free = midi
            .clone()
            .filter(|&i| self.voices[i].is_free())
            .min_by_key(|&i| (self.voices[i].last_note.abs_diff(note), i));
        if let Some(index) = free {
            return index;
        }

        midi.min_by_key(|&i| {
            let held = self.voices[i].note().unwrap_or(self.voices[i].last_note);
            (held.abs_diff(note), i)
        })
        .unwrap_or(self.first_midi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Bank = VoiceBank<16>;

    #[test]
    fn test_initial_layout() {
        let bank = Bank::new(4);
        let voices = bank.voices();
        assert_eq!(voices[0].assignment(), Assignment::Auto);
        assert_eq!(voices[1].pan(), 0.5);
        assert_eq!(voices[2].formant_ratio(), 1.01);
        assert_eq!(voices[3].velocity(), 65);
        assert_eq!(voices[4].pan(), -0.5);
        assert!((voices[15].pan() - (11.0 / 12.0 - 0.5)).abs() < 1e-6);
        assert!(voices[1..].iter().all(Voice::is_free));
        assert!(voices.iter().all(|v| v.next_grain() == 250.0 && v.ratio() == 1.0));
    }

    #[test]
    fn test_roles() {
        let bank = Bank::new(4);
        assert_eq!(bank.role(0), VoiceRole::Lead);
        assert_eq!(bank.role(3), VoiceRole::Harmony);
        assert_eq!(bank.role(4), VoiceRole::Midi);
    }

    #[test]
    fn test_note_on_resets_countdown() {
        let mut bank = Bank::new(4);
        let index = bank.note_on(72, 90, 1234);
        let voice = &bank.voices()[index];
        assert_eq!(voice.note(), Some(72));
        assert_eq!(voice.velocity(), 90);
        assert_eq!(voice.next_grain(), 0.0);
        assert_eq!(voice.assigned_at(), 1234);
    }

    #[test]
    fn test_repeated_note_keeps_slot() {
        let mut bank = Bank::new(4);
        let first = bank.note_on(60, 100, 0);
        bank.note_on(62, 100, 0);
        assert_eq!(bank.note_on(60, 50, 0), first);
        assert_eq!(bank.held_notes().filter(|&n| n == 60).count(), 1);
    }

    #[test]
    fn test_note_off_remembers_last_note() {
        let mut bank = Bank::new(4);
        let index = bank.note_on(67, 100, 0);
        assert!(bank.note_off(67));
        assert!(!bank.note_off(67));
        assert!(bank.voices()[index].is_free());
        assert_eq!(bank.voices()[index].last_note(), 67);
    }

    #[test]
    fn test_all_notes_off() {
        let mut bank = Bank::new(4);
        for note in 60..70 {
            bank.note_on(note, 100, 0);
        }
        bank.all_notes_off();
        assert_eq!(bank.held_notes().count(), 0);
        assert_eq!(bank.voices()[0].assignment(), Assignment::Auto);
    }

    #[test]
    fn test_begin_update_frees_harmony() {
        let mut bank = Bank::new(4);
        bank.voice_mut(2).claim();
        bank.voice_mut(2).set_target_ratio(1.5);
        bank.note_on(60, 100, 0);
        bank.begin_update();
        assert!(bank.voices()[2].is_free());
        assert_eq!(bank.voices()[2].target_ratio(), 1.0);
        assert_eq!(bank.held_notes().count(), 1);
    }

    #[test]
    fn test_steal_nearest_sounding_note() {
        let mut bank = Bank::new(4);
        let notes = [40, 45, 50, 55, 60, 65, 70, 75, 80, 85, 90, 95];
        for (k, &note) in notes.iter().enumerate() {
            assert_eq!(bank.note_on(note, 100, 0), 4 + k);
        }
        // 58 is closest to 60 (slot 8)
        assert_eq!(bank.note_on(58, 100, 0), 8);
        // 62 is 4 from 58 (slot 8) and 3 from 65 (slot 9)
        assert_eq!(bank.note_on(62, 100, 0), 9);
    }
}
