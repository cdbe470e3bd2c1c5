//! Coro Harmonizer - real-time PSOLA pitch tracking and harmony
//!
//! A streaming kernel that follows the pitch of a monophonic input and
//! resynthesizes pitch-shifted copies of it with pitch-synchronous
//! overlap-add (PSOLA).
//!
//! - [`kernel`] - [`HarmonizerKernel`]: lifecycle, render loop, voice updates
//! - [`epoch`] - pitch-mark tracking with centroid refinement
//! - [`voice`] - voice slots, MIDI allocation and stealing
//! - [`grain`] - fixed grain pool and window table
//! - [`chords`] - chord tables, triads and key detection
//! - [`harmony`] - debounced key analysis
//! - [`lead`] - lead resampler used without pitch correction
//! - [`params`] - parameter address space
//! - [`midi`] - MIDI message parsing
//! - [`control`] - lock-free control queue for other threads
//! - [`tuning`] - fixed tuning constants
//!
//! ## Voices
//!
//! | Slots | Role |
//! |-------|------|
//! | 0 | Lead (the input, optionally pitch-corrected) |
//! | 1-3 | Automatic harmony or triad |
//! | 4-15 | MIDI notes |
//!
//! ## Example
//!
//! ```rust
//! use coro_harmonizer::{HarmonizerKernel, HarmonizerParam, MidiMessage};
//!
//! let mut kernel = HarmonizerKernel::new();
//! kernel.init(1, 48000.0).unwrap();
//! kernel.set(HarmonizerParam::PitchCorrect, 1.0);
//!
//! let handle = kernel.control_handle();
//! std::thread::spawn(move || {
//!     handle.send_midi(MidiMessage::NoteOn { note: 64, velocity: 100 });
//! })
//! .join()
//! .unwrap();
//!
//! let input = vec![0.0; 256];
//! let mut output = vec![0.0; 256];
//! kernel.render(256, 0, &input, &mut [&mut output]);
//! assert_eq!(kernel.held_notes().collect::<Vec<_>>(), vec![64]);
//! ```

pub mod chords;
pub mod control;
pub mod epoch;
pub mod error;
pub mod grain;
pub mod harmony;
pub mod kernel;
pub mod lead;
pub mod midi;
pub mod params;
pub mod tuning;
pub mod voice;

pub use chords::{ChordQuality, ChordTables, KeyCenter};
pub use control::{ControlHandle, ControlMessage, ParamMirror};
pub use epoch::PitchMarks;
pub use error::{KernelError, Result};
pub use grain::{Grain, GrainPool, GrainWindow};
pub use harmony::HarmonyAnalyzer;
pub use kernel::{HarmonizerKernel, KernelStats};
pub use lead::LeadResampler;
pub use midi::MidiMessage;
pub use params::{HarmonizerParam, PARAM_COUNT, Settings};
pub use voice::{Assignment, Voice, VoiceBank, VoiceRole};
