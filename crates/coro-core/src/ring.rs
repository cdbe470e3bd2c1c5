//! Circular sample store with guard samples at the seam.
//!
//! The harmonizer keeps the last few thousand input samples in a
//! [`RingBuffer`]. The pitch estimator copies windows out of it, the pitch-mark
//! tracker searches it, and every active grain reads it with four-point
//! interpolation once per sample.
//!
//! # Guard Samples
//!
//! The first [`GUARD_SAMPLES`] slots are mirrored past the logical end of the
//! storage. A four-point read starting anywhere in `0..len` therefore stays in
//! contiguous memory and never needs a wraparound branch.
//!
//! ```text
//!  index:  0   1   2   3  ...  len-1 | len  len+1 len+2
//!  value:  a   b   c   d  ...    z   |  a     b     c
//! ```
//!
//! # Addressing
//!
//! Integer positions wrap with a mask (`len` is a power of two). Fractional
//! positions, used by grains and pitch marks, wrap with [`RingBuffer::wrap_pos`].

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use crate::math::cubic_interp;

/// Number of samples mirrored past the end of the ring.
pub const GUARD_SAMPLES: usize = 3;

/// Power-of-two circular buffer of recent input samples.
///
/// # Memory
///
/// Storage is allocated once by [`new`](Self::new) and never reallocated.
///
/// # Example
///
/// ```rust
/// use coro_core::RingBuffer;
///
/// let mut ring = RingBuffer::new(8);
/// for n in 0..10 {
///     ring.write(n as f32);
/// }
/// // Samples 8 and 9 overwrote slots 0 and 1.
/// assert_eq!(ring.at(1), 9.0);
/// // A read from the last slot continues into the mirrored head.
/// assert_eq!(ring.read_cubic(7.0), 8.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RingBuffer {
    /// `len + GUARD_SAMPLES` samples
    buffer: Vec<f32>,
    mask: usize,
    write_pos: usize,
}

impl RingBuffer {
    /// Creates a zeroed ring holding `len` samples.
    ///
    /// # Panics
    ///
    /// Panics if `len` is not a power of two or is smaller than
    /// `GUARD_SAMPLES + 1`.
    pub fn new(len: usize) -> Self {
        assert!(len.is_power_of_two(), "Ring length must be a power of two");
        assert!(len > GUARD_SAMPLES, "Ring length must exceed the guard");

        Self {
            buffer: vec![0.0; len + GUARD_SAMPLES],
            mask: len - 1,
            write_pos: 0,
        }
    }

    /// Logical capacity in samples (excluding guard samples).
    #[inline]
    pub fn len(&self) -> usize {
        self.mask + 1
    }

    /// Always `false`; a ring holds at least `GUARD_SAMPLES + 1` samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Index mask (`len - 1`).
    #[inline]
    pub fn mask(&self) -> usize {
        self.mask
    }

    /// Slot the next [`write`](Self::write) will fill.
    #[inline]
    pub fn write_pos(&self) -> usize {
        self.write_pos
    }

    /// Stores one sample and advances the write cursor.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        let pos = self.write_pos;
        self.buffer[pos] = sample;
        if pos < GUARD_SAMPLES {
            self.buffer[self.mask + 1 + pos] = sample;
        }
        self.write_pos = (pos + 1) & self.mask;
    }

    /// Sample at an integer position; any `usize` is wrapped.
    #[inline]
    pub fn at(&self, index: usize) -> f32 {
        self.buffer[index & self.mask]
    }

    /// Wraps a fractional position into `[0, len)`.
    ///
    /// Positions are expected within a few ring lengths of the valid range.
    /// Non-finite positions map to zero.
    #[inline]
    pub fn wrap_pos(&self, mut pos: f32) -> f32 {
        if !pos.is_finite() {
            return 0.0;
        }
        let len = self.len() as f32;
        while pos < 0.0 {
            pos += len;
        }
        while pos >= len {
            pos -= len;
        }
        pos
    }

    /// Cubic read at a fractional position.
    ///
    /// Uses the four samples starting at `floor(pos)` and interpolates
    /// between the second and third, so the result lags `pos` by one sample.
    /// Out-of-range positions are wrapped first.
    #[inline]
    pub fn read_cubic(&self, pos: f32) -> f32 {
        let pos = self.wrap_pos(pos);
        let base = (pos as usize).min(self.mask);
        let frac = pos - base as f32;
        cubic_interp(&self.buffer[base..base + 4], frac)
    }

    /// Copies `out.len()` consecutive samples beginning at `start`.
    pub fn copy_window(&self, start: usize, out: &mut [f32]) {
        for (offset, slot) in out.iter_mut().enumerate() {
            *slot = self.at(start.wrapping_add(offset));
        }
    }

    /// Zeroes the storage and rewinds the write cursor.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }
}
