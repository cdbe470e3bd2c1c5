//! Pitch-mark (epoch) tracking.
//!
//! Marks are fractional ring positions one period apart. The newest mark is
//! projected one period past the previous one and, while the input is
//! voiced, pulled onto the centre of mass of the waveform around the
//! projection:
//!
//! ```text
//! offset = sum(k * (x[p + k] - min)) / sum(x[p + k] - min),  k in -T/4..T/4
//! ```
//!
//! Marks trail the write cursor by at least `2 * MAX_PERIOD` samples so the
//! search window is always fully written.

use coro_core::RingBuffer;

use crate::tuning::{ANALYSIS_LAG, MARK_ADVANCE};

/// Number of marks kept.
pub const MARK_HISTORY: usize = 3;

/// The three most recent pitch marks, newest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchMarks {
    marks: [Option<f32>; MARK_HISTORY],
}

impl Default for PitchMarks {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchMarks {
    /// History after reset: one mark at position zero.
    pub const fn new() -> Self {
        Self {
            marks: [Some(0.0), None, None],
        }
    }

    /// Marks, newest first.
    pub fn marks(&self) -> [Option<f32>; MARK_HISTORY] {
        self.marks
    }

    /// Newest mark.
    pub fn latest(&self) -> f32 {
        self.marks[0].unwrap_or(0.0)
    }

    /// True once the history is full; synthesis waits for this.
    pub fn is_primed(&self) -> bool {
        self.marks[MARK_HISTORY - 1].is_some()
    }

    /// Distance from the newest mark to the analysis point behind `cursor`.
    pub fn lag(&self, ring: &RingBuffer, cursor: usize) -> f32 {
        let analysis = cursor as f32 - ANALYSIS_LAG as f32;
        ring.wrap_pos(analysis - self.latest())
    }

    /// True when the newest mark trails the analysis point by more than
    /// `MARK_ADVANCE` periods.
    pub fn due(&self, ring: &RingBuffer, cursor: usize, period: f32) -> bool {
        self.lag(ring, cursor) > MARK_ADVANCE * period
    }

    /// Shifts the history and places a new mark one period on.
    pub fn advance(&mut self, ring: &RingBuffer, period: f32, voiced: bool) {
        self.marks.rotate_right(1);
        let projected = ring.wrap_pos(self.marks[1].unwrap_or(0.0) + period);
        let mark = if voiced {
            ring.wrap_pos(projected + centroid_offset(ring, projected, period))
        } else {
            projected
        };
        self.marks[0] = Some(mark);
    }

    /// Restores the initial history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Centre-of-mass offset of `x - min` over `±period/4` around `center`.
///
/// A flat window has no mass; the offset is then zero.
fn centroid_offset(ring: &RingBuffer, center: f32, period: f32) -> f32 {
    let half = (period / 4.0) as isize;
    if half <= 0 {
        return 0.0;
    }
    let base = center as isize;
    let at = |k: isize| ring.at(base.wrapping_add(k) as usize);

    let min = (-half..half).map(&at).fold(f32::INFINITY, f32::min);

    let (mut moment, mut mass) = (0.0f32, 0.0f32);
    for k in -half..half {
        let weight = at(k) - min;
        moment += k as f32 * weight;
        mass += weight;
    }

    if mass > 0.0 { moment / mass } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    #[test]
    fn test_initial_state() {
        let marks = PitchMarks::new();
        assert_eq!(marks.marks(), [Some(0.0), None, None]);
        assert!(!marks.is_primed());
    }

    #[test]
    fn test_unvoiced_advance_is_projection() {
        let ring = RingBuffer::new(4096);
        let mut marks = PitchMarks::new();
        marks.advance(&ring, 400.0, false);
        marks.advance(&ring, 400.0, false);
        assert_eq!(marks.marks(), [Some(800.0), Some(400.0), Some(0.0)]);
        assert!(marks.is_primed());
    }

    #[test]
    fn test_projection_wraps() {
        let ring = RingBuffer::new(4096);
        let mut marks = PitchMarks::new();
        for _ in 0..11 {
            marks.advance(&ring, 400.0, false);
        }
        assert_eq!(marks.latest(), 4400.0 - 4096.0);
    }

    #[test]
    fn test_flat_window_keeps_projection() {
        let mut ring = RingBuffer::new(4096);
        for _ in 0..4096 {
            ring.write(0.25);
        }
        let mut marks = PitchMarks::new();
        marks.advance(&ring, 200.0, true);
        assert_eq!(marks.latest(), 200.0);
    }

    #[test]
    fn test_refinement_moves_toward_peak() {
        let mut ring = RingBuffer::new(4096);
        // Peaks at multiples of 200 plus 30
        for n in 0..4096 {
            ring.write((TAU * (n as f32 - 30.0) / 200.0).cos());
        }
        let mut marks = PitchMarks::new();
        marks.advance(&ring, 200.0, true);
        let mark = marks.latest();
        assert!(mark > 200.0 && mark <= 230.0, "mark {mark}");
    }

    #[test]
    fn test_due_measures_from_analysis_point() {
        let ring = RingBuffer::new(4096);
        let marks = PitchMarks::new();
        // Analysis point sits 1200 behind the cursor
        assert!(!marks.due(&ring, 1200 + 400, 400.0));
        assert!(marks.due(&ring, 1200 + 501, 400.0));
    }
}
