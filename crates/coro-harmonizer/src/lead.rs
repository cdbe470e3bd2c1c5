//! Lead voice without pitch correction: a cubic resampler that trails the
//! write cursor.
//!
//! The read head steps `ratio` samples per output sample. When it drifts
//! more than one period away from [`LEAD_LATENCY`] samples behind the
//! cursor it jumps by a whole period, which keeps the splice in phase.

use coro_core::RingBuffer;

use crate::tuning::LEAD_LATENCY;

/// Read head of the lead resampler.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LeadResampler {
    pos: f32,
}

impl LeadResampler {
    /// Read head at ring position zero.
    pub const fn new() -> Self {
        Self { pos: 0.0 }
    }

    /// Current read position.
    pub fn position(&self) -> f32 {
        self.pos
    }

    /// Advances the read head and returns the next sample.
    ///
    /// `cursor` is the ring write position after the newest sample.
    #[inline]
    pub fn next(&mut self, ring: &RingBuffer, cursor: usize, period: f32, ratio: f32) -> f32 {
        let distance = ring.wrap_pos(cursor as f32 - self.pos);
        if distance > LEAD_LATENCY + period {
            self.pos += period;
        } else if distance < LEAD_LATENCY - period {
            self.pos -= period;
        }
        self.pos = ring.wrap_pos(self.pos + ratio);
        ring.read_cubic(self.pos)
    }

    /// Returns the read head to position zero.
    pub fn reset(&mut self) {
        self.pos = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settles_behind_cursor() {
        let mut ring = RingBuffer::new(4096);
        let mut lead = LeadResampler::new();
        let period = 200.0;
        for n in 0..6000 {
            ring.write((n as f32 * 0.01).sin());
            lead.next(&ring, ring.write_pos(), period, 1.0);
        }
        let distance = ring.wrap_pos(ring.write_pos() as f32 - lead.position());
        assert!(
            (LEAD_LATENCY - period..=LEAD_LATENCY + period).contains(&distance),
            "distance {distance}"
        );
    }

    #[test]
    fn test_unity_ratio_replays_input() {
        let mut ring = RingBuffer::new(4096);
        let mut lead = LeadResampler::new();
        let input: Vec<f32> = (0..8000).map(|n| (n as f32 * 0.05).sin()).collect();
        let mut output = Vec::with_capacity(input.len());
        for &x in &input {
            ring.write(x);
            output.push(lead.next(&ring, ring.write_pos(), 400.0, 1.0));
        }
        // Once settled the head moves one sample per sample
        let p1 = lead.position();
        ring.write(0.0);
        lead.next(&ring, ring.write_pos(), 400.0, 1.0);
        let step = ring.wrap_pos(lead.position() - p1);
        assert!((step - 1.0).abs() < 1e-3, "step {step}");
        assert!(output.iter().all(|s| s.is_finite()));
    }
}
