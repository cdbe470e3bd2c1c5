//! Helpers shared by several commands.

use coro_core::freq_to_midi;
use indicatif::{ProgressBar, ProgressStyle};

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Parses `name=value` with a numeric value.
pub fn parse_key_val(s: &str) -> Result<(String, f32), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid parameter format: '{s}' (expected name=value)"))?;
    let value = value
        .trim()
        .parse::<f32>()
        .map_err(|e| format!("Invalid value for '{key}': {e}"))?;
    Ok((key.trim().to_string(), value))
}

/// Nearest note name with octave and cents offset, e.g. `A4 +3c`.
pub fn note_name(freq: f32) -> String {
    if !freq.is_finite() || freq <= 0.0 {
        return "-".to_string();
    }
    let midi = freq_to_midi(freq);
    let nearest = midi.round();
    let cents = ((midi - nearest) * 100.0).round() as i32;
    let index = (nearest as i32).rem_euclid(12) as usize;
    let octave = (nearest as i32).div_euclid(12) - 1;
    format!("{}{} {:+}c", NOTE_NAMES[index], octave, cents)
}

/// Bar used for long-running file operations.
pub fn progress_bar(len: u64) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(parse_key_val("auto_voices=2"), Ok(("auto_voices".into(), 2.0)));
        assert_eq!(parse_key_val(" triad = -1 "), Ok(("triad".into(), -1.0)));
        assert!(parse_key_val("auto_voices").is_err());
        assert!(parse_key_val("auto_voices=many").is_err());
    }

    #[test]
    fn test_note_name() {
        assert_eq!(note_name(440.0), "A4 +0c");
        assert_eq!(note_name(261.63), "C4 +0c");
        assert_eq!(note_name(0.0), "-");
        assert!(note_name(452.0).starts_with("A4 +"));
    }
}
