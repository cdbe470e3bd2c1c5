//! Parameter address space.
//!
//! | Address | Parameter | Range | Default |
//! |---------|-----------|-------|---------|
//! | 0 | Key center (`quality * 12 + root`) | 0–35 | 0 (C major) |
//! | 1 | Inversion | 0–3 | 2 |
//! | 2 | Automatic voices (lead included) | 1–4 | 4 |
//! | 3 | Automatic harmony | off/on | on |
//! | 4 | MIDI voices | off/on | on |
//! | 5 | Triad (-1 = off) | -1–17 | -1 |
//! | 6 | Bypass | off/on | off |
//! | 7 | Pitch correction | off/on | off |
//! | 8 | Harmony gain | 0–2 | 1 |
//! | 9 | Voice gain | 0–2 | 1 |
//! | 10 | Speed | 0–1 | 1 |
//! | 11–154 | Chord entries, semitones | -23–23 | table default |
//!
//! Chord entry `address - 11 = (quality * 12 + degree) * 4 + voice`.

use coro_core::{ParamDescriptor, ParamId, ParamUnit};

use crate::chords::{ChordQuality, DEGREES, ROW_LEN, default_entry};

/// Total number of addresses.
pub const PARAM_COUNT: usize = 155;

/// Address of the first chord entry.
pub const CHORD_BASE: u32 = 11;

/// A parameter of the harmonizer kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HarmonizerParam {
    /// Root and quality of the key
    KeyCenter,
    /// Harmony slots above this index drop an octave
    Inversion,
    /// Lead plus automatic harmony voice count
    AutoVoices,
    /// Derive harmony from the chord tables
    AutoHarmony,
    /// Let MIDI notes drive voices
    MidiVoices,
    /// Fixed triad override
    Triad,
    /// Pass the input through attenuated
    Bypass,
    /// Run the lead through PSOLA locked to the nearest semitone
    PitchCorrect,
    /// Level of every non-lead voice
    HarmonyGain,
    /// Level of the lead voice
    VoiceGain,
    /// Stored and reported only
    Speed,
    /// One chord table entry
    ChordEntry {
        /// Table
        quality: ChordQuality,
        /// Scale degree, `0..12`
        degree: u8,
        /// Voice slot, `0..4`
        voice: u8,
    },
}

impl HarmonizerParam {
    /// Parameters below the chord table, in address order.
    pub const NAMED: [HarmonizerParam; CHORD_BASE as usize] = [
        Self::KeyCenter,
        Self::Inversion,
        Self::AutoVoices,
        Self::AutoHarmony,
        Self::MidiVoices,
        Self::Triad,
        Self::Bypass,
        Self::PitchCorrect,
        Self::HarmonyGain,
        Self::VoiceGain,
        Self::Speed,
    ];

    /// Decodes an address.
    ///
    /// # Example
    ///
    /// ```rust
    /// use coro_harmonizer::HarmonizerParam;
    /// use coro_harmonizer::chords::ChordQuality;
    ///
    /// assert_eq!(HarmonizerParam::from_address(5), Some(HarmonizerParam::Triad));
    /// assert_eq!(
    ///     HarmonizerParam::from_address(11 + 13 * 4 + 2),
    ///     Some(HarmonizerParam::ChordEntry { quality: ChordQuality::Minor, degree: 1, voice: 2 })
    /// );
    /// assert_eq!(HarmonizerParam::from_address(155), None);
    /// ```
    pub fn from_address(address: u32) -> Option<Self> {
        if let Some(&param) = Self::NAMED.get(address as usize) {
            return Some(param);
        }
        let offset = address.checked_sub(CHORD_BASE)? as usize;
        let row = offset / ROW_LEN;
        let quality = ChordQuality::from_index(row / DEGREES)?;
        Some(Self::ChordEntry {
            quality,
            degree: (row % DEGREES) as u8,
            voice: (offset % ROW_LEN) as u8,
        })
    }

    /// Address of this parameter.
    pub fn address(self) -> u32 {
        match self {
            Self::ChordEntry {
                quality,
                degree,
                voice,
            } => {
                let row = quality.index() * DEGREES + usize::from(degree);
                CHORD_BASE + (row * ROW_LEN + usize::from(voice)) as u32
            }
            named => Self::NAMED
                .iter()
                .position(|&p| p == named)
                .map_or(0, |index| index as u32),
        }
    }

    /// Every parameter in address order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..PARAM_COUNT as u32).filter_map(Self::from_address)
    }

    /// True for boolean switches.
    pub fn is_toggle(self) -> bool {
        matches!(
            self,
            Self::AutoHarmony | Self::MidiVoices | Self::Bypass | Self::PitchCorrect
        )
    }

    /// Range, default and identity of this parameter.
    pub fn descriptor(self) -> ParamDescriptor {
        let desc = match self {
            Self::KeyCenter => ParamDescriptor::stepped("Key Center", "Key", 0.0, 35.0, 0.0)
                .with_id(ParamId(0), "key_center"),
            Self::Inversion => ParamDescriptor::stepped("Inversion", "Inv", 0.0, 3.0, 2.0)
                .with_id(ParamId(1), "inversion"),
            Self::AutoVoices => ParamDescriptor::stepped("Auto Voices", "Voices", 1.0, 4.0, 4.0)
                .with_id(ParamId(2), "auto_voices"),
            Self::AutoHarmony => ParamDescriptor::toggle("Auto Harmony", "Auto", true)
                .with_id(ParamId(3), "auto_harmony"),
            Self::MidiVoices => ParamDescriptor::toggle("MIDI Voices", "MIDI", true)
                .with_id(ParamId(4), "midi_voices"),
            Self::Triad => ParamDescriptor::stepped("Triad", "Triad", -1.0, 17.0, -1.0)
                .with_id(ParamId(5), "triad"),
            Self::Bypass => {
                ParamDescriptor::toggle("Bypass", "Bypass", false).with_id(ParamId(6), "bypass")
            }
            Self::PitchCorrect => ParamDescriptor::toggle("Pitch Correct", "Correct", false)
                .with_id(ParamId(7), "pitch_correct"),
            Self::HarmonyGain => ParamDescriptor::gain("Harmony Gain", "HGain", 2.0, 1.0)
                .with_id(ParamId(8), "harmony_gain")
                .with_group("mix"),
            Self::VoiceGain => ParamDescriptor::gain("Voice Gain", "VGain", 2.0, 1.0)
                .with_id(ParamId(9), "voice_gain")
                .with_group("mix"),
            Self::Speed => ParamDescriptor::new("Speed", "Speed", 0.0, 1.0, 1.0)
                .with_id(ParamId(10), "speed")
                .with_unit(ParamUnit::None),
            Self::ChordEntry {
                quality,
                degree,
                voice,
            } => {
                let default = default_entry(quality, usize::from(degree), usize::from(voice));
                return ParamDescriptor::semitones("Chord Interval", "Intvl", -23.0, 23.0, default as f32)
                    .with_id(ParamId(self.address()), "chord_interval")
                    .with_group("chords");
            }
        };
        if desc.group.is_empty() {
            desc.with_group("harmony")
        } else {
            desc
        }
    }
}

/// Plain values of the named parameters other than the key center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Harmony slots above this index drop an octave
    pub inversion: u8,
    /// Lead plus automatic harmony voices, `1..=4`
    pub auto_voices: u8,
    /// Chord-table harmony enabled
    pub auto_harmony: bool,
    /// MIDI-driven voices enabled
    pub midi_voices: bool,
    /// Triad override
    pub triad: Option<u8>,
    /// Bypass
    pub bypass: bool,
    /// Lead pitch correction
    pub pitch_correct: bool,
    /// Harmony gain target
    pub harmony_gain: f32,
    /// Lead level
    pub voice_gain: f32,
    /// Reported only
    pub speed: f32,
}

impl Default for Settings {
    fn default() -> Self {
        let default = |p: HarmonizerParam| p.descriptor().default;
        Self {
            inversion: default(HarmonizerParam::Inversion) as u8,
            auto_voices: default(HarmonizerParam::AutoVoices) as u8,
            auto_harmony: default(HarmonizerParam::AutoHarmony) >= 0.5,
            midi_voices: default(HarmonizerParam::MidiVoices) >= 0.5,
            triad: None,
            bypass: default(HarmonizerParam::Bypass) >= 0.5,
            pitch_correct: default(HarmonizerParam::PitchCorrect) >= 0.5,
            harmony_gain: default(HarmonizerParam::HarmonyGain),
            voice_gain: default(HarmonizerParam::VoiceGain),
            speed: default(HarmonizerParam::Speed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coro_core::ParamFlags;

    #[test]
    fn test_address_roundtrip_covers_space() {
        let params: Vec<_> = HarmonizerParam::all().collect();
        assert_eq!(params.len(), PARAM_COUNT);
        for (address, param) in params.iter().enumerate() {
            assert_eq!(param.address(), address as u32);
        }
    }

    #[test]
    fn test_chord_address_layout() {
        let last = HarmonizerParam::from_address(154).unwrap();
        assert_eq!(
            last,
            HarmonizerParam::ChordEntry {
                quality: ChordQuality::Blues,
                degree: 11,
                voice: 3
            }
        );
        assert_eq!(HarmonizerParam::from_address(u32::MAX), None);
    }

    #[test]
    fn test_descriptors() {
        let key = HarmonizerParam::KeyCenter.descriptor();
        assert_eq!(key.string_id, "key_center");
        assert!(key.flags.contains(ParamFlags::STEPPED));
        assert_eq!(key.clamp(99.0), 35.0);

        let triad = HarmonizerParam::Triad.descriptor();
        assert_eq!(triad.clamp(-7.0), -1.0);
        assert_eq!(triad.clamp(30.0), 17.0);

        let entry = HarmonizerParam::from_address(CHORD_BASE + 1).unwrap().descriptor();
        assert_eq!(entry.default, 4.0);
        assert_eq!(entry.group, "chords");
        assert_eq!(entry.clamp(-40.0), -23.0);

        assert!(HarmonizerParam::Bypass.is_toggle());
        assert_eq!(HarmonizerParam::Bypass.descriptor().clamp(0.5), 1.0);
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.inversion, 2);
        assert_eq!(settings.auto_voices, 4);
        assert!(settings.auto_harmony && settings.midi_voices);
        assert!(!settings.bypass && !settings.pitch_correct);
        assert_eq!(settings.triad, None);
        assert_eq!(settings.harmony_gain, 1.0);
    }
}
