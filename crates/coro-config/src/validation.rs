//! Session validation.
//!
//! Parameters are looked up by the `string_id` of their descriptor, so a
//! session file uses the same names the `coro params` listing prints. Values
//! are checked against the descriptor range instead of being silently clamped.
//!
//! # Example
//!
//! ```rust
//! use coro_config::{ValidationError, validate_param};
//!
//! assert!(validate_param("harmony_gain", 0.5).is_ok());
//! assert!(matches!(
//!     validate_param("harmony_gain", 3.0),
//!     Err(ValidationError::OutOfRange { .. })
//! ));
//! ```

use coro_harmonizer::{ChordQuality, HarmonizerParam};
use thiserror::Error;

use crate::session::{ChordOverride, MidiEvent, Session};

/// Validation error types.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// No named parameter has this id.
    #[error("unknown parameter '{0}'")]
    UnknownParameter(String),

    /// Parameter value out of range.
    #[error("parameter '{param}' value {value} out of range [{min}, {max}]")]
    OutOfRange {
        /// Name of the parameter.
        param: String,
        /// The value that was out of range.
        value: f32,
        /// Minimum allowed value.
        min: f32,
        /// Maximum allowed value.
        max: f32,
    },

    /// A chord override addresses no entry or holds a bad interval.
    #[error("invalid chord entry {quality}/{degree}/{voice}: {reason}")]
    InvalidChordEntry {
        /// Quality name as written.
        quality: String,
        /// Scale degree.
        degree: u8,
        /// Voice within the row.
        voice: u8,
        /// What is wrong with it.
        reason: String,
    },

    /// A scripted MIDI event cannot be delivered.
    #[error("invalid MIDI event #{index}: {reason}")]
    InvalidMidiEvent {
        /// Position in the script.
        index: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// A session-level setting is unusable.
    #[error("invalid setting '{field}': {reason}")]
    InvalidSetting {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// Multiple validation errors.
    #[error("multiple validation errors: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
    Multiple(Vec<ValidationError>),
}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Finds a named parameter by its string id.
pub fn lookup_param(name: &str) -> Option<HarmonizerParam> {
    HarmonizerParam::NAMED
        .into_iter()
        .find(|param| param.descriptor().string_id == name)
}

/// Checks a named parameter and its value.
pub fn validate_param(name: &str, value: f32) -> ValidationResult<HarmonizerParam> {
    let param = lookup_param(name).ok_or_else(|| ValidationError::UnknownParameter(name.into()))?;
    let desc = param.descriptor();
    if !value.is_finite() || value < desc.min || value > desc.max {
        return Err(ValidationError::OutOfRange {
            param: name.into(),
            value,
            min: desc.min,
            max: desc.max,
        });
    }
    Ok(param)
}

/// Checks a chord override and resolves it to its parameter.
pub fn validate_chord(entry: &ChordOverride) -> ValidationResult<HarmonizerParam> {
    let invalid = |reason: String| ValidationError::InvalidChordEntry {
        quality: entry.quality.clone(),
        degree: entry.degree,
        voice: entry.voice,
        reason,
    };

    let quality = ChordQuality::from_name(&entry.quality)
        .ok_or_else(|| invalid("quality must be major, minor or blues".into()))?;
    if usize::from(entry.degree) >= coro_harmonizer::chords::DEGREES {
        return Err(invalid("degree must be below 12".into()));
    }
    if usize::from(entry.voice) >= coro_harmonizer::chords::ROW_LEN {
        return Err(invalid("voice must be below 4".into()));
    }
    let limit = coro_harmonizer::chords::MAX_ENTRY_SEMITONES;
    if entry.semitones.abs() > limit {
        return Err(invalid(format!("{} semitones exceeds ±{limit}", entry.semitones)));
    }

    Ok(HarmonizerParam::ChordEntry {
        quality,
        degree: entry.degree,
        voice: entry.voice,
    })
}

/// Checks one scripted MIDI event.
pub fn validate_midi(index: usize, event: &MidiEvent) -> ValidationResult<()> {
    if !event.time.is_finite() || event.time < 0.0 {
        return Err(ValidationError::InvalidMidiEvent {
            index,
            reason: format!("time {} is not a non-negative number of seconds", event.time),
        });
    }
    if event.message.to_midi().is_none() {
        return Err(ValidationError::InvalidMidiEvent {
            index,
            reason: "data bytes must be 0..=127".into(),
        });
    }
    Ok(())
}

/// Checks every part of a session and reports all problems at once.
pub fn validate_session(session: &Session) -> ValidationResult<()> {
    let mut errors = Vec::new();

    if session.sample_rate == 0 {
        errors.push(ValidationError::InvalidSetting {
            field: "sample_rate",
            reason: "must be positive".into(),
        });
    }
    if session.block_size == 0 {
        errors.push(ValidationError::InvalidSetting {
            field: "block_size",
            reason: "must be positive".into(),
        });
    }

    errors.extend(
        session
            .params
            .iter()
            .filter_map(|(name, &value)| validate_param(name, value).err()),
    );
    errors.extend(session.chords.iter().filter_map(|c| validate_chord(c).err()));
    errors.extend(
        session
            .midi
            .iter()
            .enumerate()
            .filter_map(|(i, e)| validate_midi(i, e).err()),
    );

    match errors.len() {
        0 => Ok(()),
        1 => Err(errors.remove(0)),
        _ => Err(ValidationError::Multiple(errors)),
    }
}
