//! FFT wrapper with windowing functions
//!
//! [`Fft`] holds a forward and an inverse plan of one size. The `*_with_scratch`
//! methods take a caller-owned scratch buffer so steady-state use performs no
//! allocation; size the scratch with [`Fft::scratch_len`].

use rustfft::{FftPlanner, num_complex::Complex};
use std::f32::consts::PI;
use std::sync::Arc;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Rectangular (no windowing)
    Rectangular,
    /// Hann window (raised cosine), periodic form
    Hann,
    /// Hamming window
    Hamming,
}

impl Window {
    /// Weight of sample `i` in a window of length `n`.
    #[inline]
    pub fn weight(&self, i: usize, n: usize) -> f32 {
        let x = 2.0 * PI * i as f32 / n as f32;
        match self {
            Window::Rectangular => 1.0,
            Window::Hann => 0.5 * (1.0 - x.cos()),
            Window::Hamming => 0.54 - 0.46 * x.cos(),
        }
    }

    /// Apply window to a buffer
    pub fn apply(&self, buffer: &mut [f32]) {
        let n = buffer.len();
        for (i, sample) in buffer.iter_mut().enumerate() {
            *sample *= self.weight(i, n);
        }
    }

    /// Get window coefficients
    pub fn coefficients(&self, size: usize) -> Vec<f32> {
        (0..size).map(|i| self.weight(i, size)).collect()
    }
}

/// FFT processor holding a forward and inverse plan of one size
pub struct Fft {
    fft: Arc<dyn rustfft::Fft<f32>>,
    ifft: Arc<dyn rustfft::Fft<f32>>,
    size: usize,
}

impl std::fmt::Debug for Fft {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft").field("size", &self.size).finish()
    }
}

impl Fft {
    /// Create a new FFT processor for the given size
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let ifft = planner.plan_fft_inverse(size);

        Self { fft, ifft, size }
    }

    /// Get FFT size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Scratch length needed by the `*_with_scratch` methods.
    pub fn scratch_len(&self) -> usize {
        self.fft
            .get_inplace_scratch_len()
            .max(self.ifft.get_inplace_scratch_len())
    }

    /// Forward FFT of a real signal, zero-padded or truncated to the FFT size.
    pub fn forward(&self, input: &[f32]) -> Vec<Complex<f32>> {
        let mut buffer: Vec<Complex<f32>> = input
            .iter()
            .take(self.size)
            .map(|&x| Complex::new(x, 0.0))
            .collect();
        buffer.resize(self.size, Complex::new(0.0, 0.0));
        self.fft.process(&mut buffer);
        buffer
    }

    /// Forward FFT in place, allocating its own scratch.
    pub fn forward_complex(&self, buffer: &mut [Complex<f32>]) {
        self.fft.process(buffer);
    }

    /// Inverse FFT in place, normalized by `1/size`.
    pub fn inverse_complex(&self, buffer: &mut [Complex<f32>]) {
        self.ifft.process(buffer);
        self.normalize(buffer);
    }

    /// Forward FFT in place using caller scratch (no allocation).
    #[inline]
    pub fn forward_with_scratch(&self, buffer: &mut [Complex<f32>], scratch: &mut [Complex<f32>]) {
        self.fft.process_with_scratch(buffer, scratch);
    }

    /// Inverse FFT in place using caller scratch, normalized by `1/size`.
    #[inline]
    pub fn inverse_with_scratch(&self, buffer: &mut [Complex<f32>], scratch: &mut [Complex<f32>]) {
        self.ifft.process_with_scratch(buffer, scratch);
        self.normalize(buffer);
    }

    fn normalize(&self, buffer: &mut [Complex<f32>]) {
        let scale = 1.0 / self.size as f32;
        for c in buffer.iter_mut() {
            *c *= scale;
        }
    }
}
