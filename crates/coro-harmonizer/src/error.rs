//! Kernel lifecycle errors.

use thiserror::Error;

/// Errors reported by [`HarmonizerKernel::init`](crate::HarmonizerKernel::init).
///
/// The render path never fails; it writes silence when the kernel is not
/// initialized.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// Channel count outside `1..=MAX_CHANNELS`.
    #[error("unsupported channel count {0} (expected 1 or 2)")]
    InvalidChannelCount(usize),

    /// Sample rate that is zero, negative or not finite.
    #[error("invalid sample rate {0}")]
    InvalidSampleRate(f32),
}

/// Result type for kernel lifecycle operations.
pub type Result<T> = std::result::Result<T, KernelError>;
