//! Session files for the coro harmonizer.
//!
//! A [`Session`] is a TOML description of a harmonizer setup: parameter
//! values, chord table edits and a MIDI script timed in seconds. Sessions are
//! validated against the kernel's parameter descriptors before they touch a
//! kernel.
//!
//! # Example
//!
//! ```rust
//! use coro_config::{ChordOverride, ScriptMessage, Session};
//! use coro_harmonizer::{ChordQuality, HarmonizerKernel};
//!
//! let session = Session::new("Fourths")
//!     .with_param("auto_voices", 2.0)
//!     .with_chord(ChordOverride::new(ChordQuality::Major, 0, 1, 5))
//!     .with_midi(0.0, ScriptMessage::NoteOn { note: 65, velocity: 90 });
//!
//! let mut kernel = HarmonizerKernel::new();
//! session.apply(&mut kernel).unwrap();
//! assert_eq!(kernel.chords().semitones(ChordQuality::Major, 0, 1), 5);
//! assert_eq!(session.timed_events(48000.0).len(), 1);
//! ```

mod error;
mod session;

/// Factory sessions bundled with the library.
pub mod factory_sessions;

/// Parameter, chord and MIDI validation.
pub mod validation;

pub use error::ConfigError;
pub use factory_sessions::{
    FACTORY_SESSION_NAMES, factory_sessions, find_session, get_factory_session,
    is_factory_session,
};
pub use session::{ChordOverride, MidiEvent, ScriptMessage, Session};
pub use validation::{
    ValidationError, ValidationResult, lookup_param, validate_chord, validate_midi,
    validate_param, validate_session,
};
