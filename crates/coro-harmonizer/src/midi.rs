//! Three-byte MIDI channel messages.
//!
//! Only channel 0 is listened to. Anything else, running status, system
//! messages and data bytes with the high bit set, parses to `None`.

/// Expression controller; scales the MIDI voices.
pub const CC_EXPRESSION: u8 = 11;

/// All-notes-off controller.
pub const CC_ALL_NOTES_OFF: u8 = 123;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;

/// A channel-0 message the kernel reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MidiMessage {
    /// Start `note` at `velocity` (always non-zero)
    NoteOn {
        /// Note number
        note: u8,
        /// Velocity, `1..=127`
        velocity: u8,
    },
    /// Stop `note`
    NoteOff {
        /// Note number
        note: u8,
    },
    /// Continuous controller
    ControlChange {
        /// Controller number
        controller: u8,
        /// Value, `0..=127`
        value: u8,
    },
}

impl MidiMessage {
    /// Parses one message.
    ///
    /// Note-on with velocity zero is a note-off.
    ///
    /// # Example
    ///
    /// ```rust
    /// use coro_harmonizer::MidiMessage;
    ///
    /// assert_eq!(
    ///     MidiMessage::parse(&[0x90, 60, 100]),
    ///     Some(MidiMessage::NoteOn { note: 60, velocity: 100 })
    /// );
    /// assert_eq!(MidiMessage::parse(&[0x90, 60, 0]), Some(MidiMessage::NoteOff { note: 60 }));
    /// // Channel 2
    /// assert_eq!(MidiMessage::parse(&[0x92, 60, 100]), None);
    /// ```
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        let &[status, data1, data2] = bytes else {
            return None;
        };
        if data1 > 127 || data2 > 127 || status & 0x0F != 0 {
            return None;
        }

        match status & 0xF0 {
            NOTE_ON if data2 > 0 => Some(Self::NoteOn {
                note: data1,
                velocity: data2,
            }),
            NOTE_ON | NOTE_OFF => Some(Self::NoteOff { note: data1 }),
            CONTROL_CHANGE => Some(Self::ControlChange {
                controller: data1,
                value: data2,
            }),
            _ => None,
        }
    }

    /// Applies the parse rules to a message built in code.
    ///
    /// Data values above 127 are rejected and a note-on with velocity zero
    /// becomes a note-off.
    ///
    /// ```rust
    /// use coro_harmonizer::MidiMessage;
    ///
    /// let silent = MidiMessage::NoteOn { note: 60, velocity: 0 };
    /// assert_eq!(silent.checked(), Some(MidiMessage::NoteOff { note: 60 }));
    /// assert_eq!(MidiMessage::NoteOff { note: 200 }.checked(), None);
    /// ```
    pub fn checked(self) -> Option<Self> {
        match self {
            Self::NoteOn { note, velocity } if note > 127 || velocity > 127 => None,
            Self::NoteOn { note, velocity: 0 } => Some(Self::NoteOff { note }),
            Self::NoteOff { note } if note > 127 => None,
            Self::ControlChange { controller, value } if controller > 127 || value > 127 => None,
            message => Some(message),
        }
    }

    /// Channel-0 wire form.
    pub fn to_bytes(self) -> [u8; 3] {
        match self {
            Self::NoteOn { note, velocity } => [NOTE_ON, note & 0x7F, velocity & 0x7F],
            Self::NoteOff { note } => [NOTE_OFF, note & 0x7F, 0],
            Self::ControlChange { controller, value } => {
                [CONTROL_CHANGE, controller & 0x7F, value & 0x7F]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_messages() {
        assert_eq!(
            MidiMessage::parse(&[0x90, 64, 1]),
            Some(MidiMessage::NoteOn {
                note: 64,
                velocity: 1
            })
        );
        assert_eq!(
            MidiMessage::parse(&[0x80, 64, 90]),
            Some(MidiMessage::NoteOff { note: 64 })
        );
    }

    #[test]
    fn test_parse_control_change() {
        assert_eq!(
            MidiMessage::parse(&[0xB0, CC_EXPRESSION, 127]),
            Some(MidiMessage::ControlChange {
                controller: 11,
                value: 127
            })
        );
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(MidiMessage::parse(&[0x90, 60]), None);
        assert_eq!(MidiMessage::parse(&[0x90, 60, 100, 0]), None);
        assert_eq!(MidiMessage::parse(&[0x90, 128, 100]), None);
        assert_eq!(MidiMessage::parse(&[0x90, 60, 200]), None);
        assert_eq!(MidiMessage::parse(&[0x81, 60, 0]), None);
        // Pitch bend is not handled
        assert_eq!(MidiMessage::parse(&[0xE0, 0, 64]), None);
        assert_eq!(MidiMessage::parse(&[0x3C, 60, 0]), None);
    }

    #[test]
    fn test_checked_matches_parse_rules() {
        let on = MidiMessage::NoteOn {
            note: 60,
            velocity: 100,
        };
        assert_eq!(on.checked(), Some(on));
        assert_eq!(
            MidiMessage::NoteOn {
                note: 61,
                velocity: 0
            }
            .checked(),
            Some(MidiMessage::NoteOff { note: 61 })
        );
        assert_eq!(
            MidiMessage::NoteOn {
                note: 200,
                velocity: 100
            }
            .checked(),
            None
        );
        assert_eq!(
            MidiMessage::NoteOn {
                note: 61,
                velocity: 255
            }
            .checked(),
            None
        );
        assert_eq!(
            MidiMessage::ControlChange {
                controller: 11,
                value: 128
            }
            .checked(),
            None
        );
        assert_eq!(
            MidiMessage::ControlChange {
                controller: 200,
                value: 0
            }
            .checked(),
            None
        );
    }

    #[test]
    fn test_to_bytes() {
        let on = MidiMessage::NoteOn {
            note: 72,
            velocity: 33,
        };
        assert_eq!(on.to_bytes(), [0x90, 72, 33]);
        assert_eq!(MidiMessage::parse(&on.to_bytes()), Some(on));
        assert_eq!(MidiMessage::NoteOff { note: 72 }.to_bytes(), [0x80, 72, 0]);
    }
}
