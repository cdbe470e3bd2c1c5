//! Audio I/O for the coro harmonizer.
//!
//! This crate provides:
//!
//! - **WAV file I/O**: [`read_wav`] and [`write_wav`] for loading/saving audio files
//! - **Stereo buffers**: [`StereoSamples`] for the kernel's two output channels
//! - **Block host**: [`HarmonizerEngine`] feeds a file through the streaming
//!   kernel in host-sized blocks, with timed parameter and MIDI events
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use coro_io::{HarmonizerEngine, read_wav, write_wav_stereo};
//!
//! let (samples, spec) = read_wav("voice.wav")?;
//! let mut engine = HarmonizerEngine::new(spec.sample_rate as f32, 512)?;
//! let harmonized = engine.process(&samples);
//! write_wav_stereo("harmonized.wav", &harmonized, spec)?;
//! ```

mod engine;
mod stereo;
mod wav;

pub use engine::{EngineEvent, HarmonizerEngine, TimedEvent};
pub use stereo::StereoSamples;
pub use wav::{
    WavFormat, WavInfo, WavSpec, read_wav, read_wav_info, read_wav_stereo, write_wav,
    write_wav_stereo,
};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Kernel lifecycle error.
    #[error("Kernel error: {0}")]
    Kernel(#[from] coro_harmonizer::KernelError),

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
