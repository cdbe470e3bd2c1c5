//! Session file format and operations.

use std::collections::BTreeMap;
use std::path::Path;

use coro_harmonizer::chords::{DEGREES, ROW_LEN, default_entry};
use coro_harmonizer::{ChordQuality, HarmonizerKernel, HarmonizerParam, MidiMessage};
use coro_io::TimedEvent;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::validation::{self, ValidationResult};

/// A complete harmonizer setup: parameters, chord table edits and a MIDI
/// script to play against the input.
///
/// # TOML Format
///
/// ```toml
/// name = "Close thirds"
/// description = "Lead plus one voice a third above"
/// sample_rate = 44100
/// block_size = 256
///
/// [params]
/// auto_voices = 2
/// harmony_gain = 0.8
///
/// [[chords]]
/// quality = "major"
/// degree = 0
/// voice = 1
/// semitones = 4
///
/// [[midi]]
/// time = 0.5
/// type = "note_on"
/// note = 67
/// velocity = 100
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Name of the session.
    pub name: String,

    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Sample rate hint for generated material (defaults to 48000).
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Host block size (defaults to 512).
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Named parameter values keyed by `string_id`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, f32>,

    /// Chord table entries to overwrite.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chords: Vec<ChordOverride>,

    /// MIDI events to deliver while rendering.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub midi: Vec<MidiEvent>,
}

fn default_sample_rate() -> u32 {
    48000
}

fn default_block_size() -> usize {
    512
}

/// One chord table entry, in semitones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChordOverride {
    /// `major`, `minor` or `blues`.
    pub quality: String,
    /// Scale degree, `0..12`.
    pub degree: u8,
    /// Voice within the row, `0..4`.
    pub voice: u8,
    /// Interval from the sung note.
    pub semitones: i32,
}

impl ChordOverride {
    /// Override of one entry.
    pub fn new(quality: ChordQuality, degree: u8, voice: u8, semitones: i32) -> Self {
        Self {
            quality: quality.name().to_string(),
            degree,
            voice,
            semitones,
        }
    }
}

/// A MIDI message in a session script.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptMessage {
    /// Note on; velocity 0 acts as note off.
    NoteOn {
        /// Note number
        note: u8,
        /// Velocity
        velocity: u8,
    },
    /// Note off.
    NoteOff {
        /// Note number
        note: u8,
    },
    /// Control change.
    ControlChange {
        /// Controller number
        controller: u8,
        /// Controller value
        value: u8,
    },
}

impl ScriptMessage {
    /// Kernel message, or `None` when a data byte is out of range.
    pub fn to_midi(self) -> Option<MidiMessage> {
        let bytes = match self {
            Self::NoteOn { note, velocity } => [0x90, note, velocity],
            Self::NoteOff { note } => [0x80, note, 0],
            Self::ControlChange { controller, value } => [0xB0, controller, value],
        };
        MidiMessage::parse(&bytes)
    }
}

/// A scripted MIDI message at a time in seconds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MidiEvent {
    /// Seconds from the start of the input.
    pub time: f64,
    /// What to send.
    #[serde(flatten)]
    pub message: ScriptMessage,
}

impl MidiEvent {
    /// Message at `time` seconds.
    pub fn new(time: f64, message: ScriptMessage) -> Self {
        Self { time, message }
    }
}

impl Session {
    /// Create an empty session.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            sample_rate: default_sample_rate(),
            block_size: default_block_size(),
            params: BTreeMap::new(),
            chords: Vec::new(),
            midi: Vec::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set a named parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: f32) -> Self {
        self.params.insert(name.into(), value);
        self
    }

    /// Add a chord table override.
    pub fn with_chord(mut self, entry: ChordOverride) -> Self {
        self.chords.push(entry);
        self
    }

    /// Add a scripted MIDI event.
    pub fn with_midi(mut self, time: f64, message: ScriptMessage) -> Self {
        self.midi.push(MidiEvent::new(time, message));
        self
    }

    /// Load a session from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let session = Self::from_toml(&content)?;
        debug!(path = %path.display(), name = %session.name, "loaded session");
        Ok(session)
    }

    /// Parse a session from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the session to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the session to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every parameter, chord entry and MIDI event.
    pub fn validate(&self) -> ValidationResult<()> {
        validation::validate_session(self)
    }

    /// Validate, then write parameters and chord entries into `kernel`.
    ///
    /// The MIDI script is not delivered here; see [`timed_events`](Self::timed_events).
    pub fn apply(&self, kernel: &mut HarmonizerKernel) -> Result<(), ConfigError> {
        self.validate()?;

        for (name, &value) in &self.params {
            let param = validation::validate_param(name, value)?;
            kernel.set(param, value);
        }
        for entry in &self.chords {
            let param = validation::validate_chord(entry)?;
            kernel.set(param, entry.semitones as f32);
        }

        debug!(
            name = %self.name,
            params = self.params.len(),
            chords = self.chords.len(),
            "applied session"
        );
        Ok(())
    }

    /// The MIDI script as sample-stamped events, in time order.
    ///
    /// Events that fail validation are skipped.
    pub fn timed_events(&self, sample_rate: f32) -> Vec<TimedEvent> {
        let mut events: Vec<TimedEvent> = self
            .midi
            .iter()
            .filter(|e| e.time.is_finite() && e.time >= 0.0)
            .filter_map(|e| {
                let at = (e.time * f64::from(sample_rate)).round() as u64;
                e.message.to_midi().map(|m| TimedEvent::midi(at, m))
            })
            .collect();
        events.sort_by_key(|e| e.at);
        events
    }

    /// Captures the state of `kernel` as a session.
    ///
    /// Only values that differ from their defaults are recorded.
    pub fn from_kernel(name: impl Into<String>, kernel: &HarmonizerKernel) -> Self {
        let handle = kernel.control_handle();
        let mut session = Self::new(name);
        session.sample_rate = kernel.sample_rate() as u32;

        for param in HarmonizerParam::NAMED {
            let desc = param.descriptor();
            let value = handle.get_param(param.address());
            if value != desc.default {
                session.params.insert(desc.string_id.to_string(), value);
            }
        }

        let chords = kernel.chords();
        for quality in ChordQuality::ALL {
            for degree in 0..DEGREES {
                for voice in 0..ROW_LEN {
                    let semitones = chords.semitones(quality, degree, voice);
                    if semitones != i32::from(default_entry(quality, degree, voice)) {
                        session.chords.push(ChordOverride::new(
                            quality,
                            degree as u8,
                            voice as u8,
                            semitones,
                        ));
                    }
                }
            }
        }

        session
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new("Untitled")
    }
}
