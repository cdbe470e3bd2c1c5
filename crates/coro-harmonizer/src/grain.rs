//! PSOLA grains: a fixed pool and the shared window table.
//!
//! A grain replays `size` samples of the input ring from `start`, stepping
//! `ratio` samples per output sample, shaped by a Hann window over its
//! progress. The pool never grows: a trigger with no free slot is refused.

use coro_analysis::Window;
use coro_core::{RingBuffer, cubic_interp, pan_gains};

use crate::tuning::{WINDOW_LEN, WINDOW_SHOULDER};

/// One active grain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grain {
    /// Length in input samples (two periods)
    pub size: f32,
    /// Ring position of the first sample
    pub start: f32,
    /// Playback offset from `start`
    pub pos: f32,
    /// Input samples consumed per output sample
    pub ratio: f32,
    /// Linear gain
    pub gain: f32,
    /// Pan position, `+1` left to `-1` right
    pub pan: f32,
    /// Owning voice slot
    pub voice: usize,
}

impl Grain {
    /// Progress through the grain in `[0, 1]`.
    #[inline]
    pub fn progress(&self) -> f32 {
        if self.size > 0.0 {
            (self.pos / self.size).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

/// Hann window table with zero shoulders for four-point reads.
#[derive(Debug, Clone, PartialEq)]
pub struct GrainWindow {
    table: Vec<f32>,
}

impl Default for GrainWindow {
    fn default() -> Self {
        Self::new(WINDOW_LEN)
    }
}

impl GrainWindow {
    /// Builds a table of `points` Hann coefficients.
    pub fn new(points: usize) -> Self {
        let mut table = vec![0.0; points + 2 * WINDOW_SHOULDER];
        table[WINDOW_SHOULDER..WINDOW_SHOULDER + points]
            .copy_from_slice(&Window::Hann.coefficients(points));
        Self { table }
    }

    /// Number of window points (excluding shoulders).
    pub fn points(&self) -> usize {
        self.table.len() - 2 * WINDOW_SHOULDER
    }

    /// Interpolated window value at `progress` in `[0, 1]`.
    #[inline]
    pub fn at(&self, progress: f32) -> f32 {
        let wi = (WINDOW_SHOULDER - 1) as f32 + self.points() as f32 * progress.clamp(0.0, 1.0);
        let base = wi as usize;
        cubic_interp(&self.table[base..base + 4], wi - base as f32)
    }
}

/// Fixed-capacity grain pool.
///
/// Slots are scanned up to a high-water mark, which shrinks as trailing
/// grains finish.
#[derive(Debug, Clone, PartialEq)]
pub struct GrainPool<const N: usize> {
    slots: [Option<Grain>; N],
    /// One past the highest slot that may be active
    span: usize,
}

impl<const N: usize> Default for GrainPool<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> GrainPool<N> {
    /// Creates an empty pool.
    pub const fn new() -> Self {
        Self {
            slots: [None; N],
            span: 0,
        }
    }

    /// Pool capacity.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of active grains.
    pub fn active_count(&self) -> usize {
        self.slots[..self.span].iter().filter(|g| g.is_some()).count()
    }

    /// Active grains.
    pub fn iter(&self) -> impl Iterator<Item = &Grain> {
        self.slots[..self.span].iter().flatten()
    }

    /// Places a grain in the first free slot. Returns `false` if the pool is full.
    pub fn trigger(&mut self, grain: Grain) -> bool {
        match self.slots.iter().position(Option::is_none) {
            Some(index) => {
                self.slots[index] = Some(grain);
                self.span = self.span.max(index + 1);
                true
            }
            None => false,
        }
    }

    /// Mixes one output sample from every active grain and advances them.
    ///
    /// `harmony_gain` scales every grain not owned by the lead slot.
    /// Returns the `(left, right)` contribution.
    pub fn render(&mut self, ring: &RingBuffer, window: &GrainWindow, harmony_gain: f32) -> (f32, f32) {
        let (mut left, mut right) = (0.0, 0.0);

        for slot in &mut self.slots[..self.span] {
            let Some(grain) = slot else { continue };

            let sample = ring.read_cubic(grain.start + grain.pos);
            let shaped = sample * window.at(grain.progress()) * grain.gain;
            let shaped = if grain.voice == 0 { shaped } else { shaped * harmony_gain };
            let (gl, gr) = pan_gains(grain.pan);
            left += shaped * gl;
            right += shaped * gr;

            grain.pos += grain.ratio;
            if grain.pos > grain.size {
                *slot = None;
            }
        }

        while self.span > 0 && self.slots[self.span - 1].is_none() {
            self.span -= 1;
        }

        (left, right)
    }

    /// Frees every grain.
    pub fn clear(&mut self) {
        self.slots = [None; N];
        self.span = 0;
    }
}
