//! Sessions bundled with the library.
//!
//! These are embedded at compile time and always available, so the CLI can
//! take `--session close_thirds` without a file on disk.

use crate::{ConfigError, Session};

/// Names of the factory sessions.
pub static FACTORY_SESSION_NAMES: &[&str] =
    &["init", "close_thirds", "pitch_correct", "midi_choir", "blues_trio"];

static FACTORY_SESSIONS_TOML: &[(&str, &str)] = &[
    ("init", INIT),
    ("close_thirds", CLOSE_THIRDS),
    ("pitch_correct", PITCH_CORRECT),
    ("midi_choir", MIDI_CHOIR),
    ("blues_trio", BLUES_TRIO),
];

const INIT: &str = r#"
name = "Init"
description = "Power-on state: four automatic voices in C major"
"#;

const CLOSE_THIRDS: &str = r#"
name = "Close Thirds"
description = "Lead plus a single diatonic third above"

[params]
auto_voices = 2
inversion = 3
harmony_gain = 0.8
"#;

const PITCH_CORRECT: &str = r#"
name = "Pitch Correct"
description = "Lead snapped to the nearest semitone, no harmony"

[params]
pitch_correct = 1
auto_harmony = 0
midi_voices = 0
auto_voices = 1
"#;

const MIDI_CHOIR: &str = r#"
name = "MIDI Choir"
description = "Held notes only; the key follows the chord"

[params]
auto_harmony = 0
harmony_gain = 1.2

[[midi]]
time = 0.0
type = "note_on"
note = 60
velocity = 96

[[midi]]
time = 0.0
type = "note_on"
note = 64
velocity = 96

[[midi]]
time = 0.0
type = "note_on"
note = 67
velocity = 96
"#;

const BLUES_TRIO: &str = r#"
name = "Blues Trio"
description = "Blues tables with a major sixth on the tonic"

[params]
key_center = 24
auto_voices = 3

[[chords]]
quality = "blues"
degree = 0
voice = 2
semitones = 9
"#;

/// All factory sessions, parsed.
pub fn factory_sessions() -> Vec<Session> {
    FACTORY_SESSIONS_TOML
        .iter()
        .filter_map(|(_, toml)| Session::from_toml(toml).ok())
        .collect()
}

/// A factory session by name.
pub fn get_factory_session(name: &str) -> Result<Session, ConfigError> {
    FACTORY_SESSIONS_TOML
        .iter()
        .find(|(n, _)| *n == name)
        .ok_or_else(|| ConfigError::SessionNotFound(name.to_string()))
        .and_then(|(_, toml)| Session::from_toml(toml))
}

/// True if `name` is a factory session.
pub fn is_factory_session(name: &str) -> bool {
    FACTORY_SESSION_NAMES.contains(&name)
}

/// Loads `name_or_path` as a factory session name, falling back to a file.
pub fn find_session(name_or_path: &str) -> Result<Session, ConfigError> {
    if is_factory_session(name_or_path) {
        get_factory_session(name_or_path)
    } else {
        Session::load(name_or_path)
    }
}
