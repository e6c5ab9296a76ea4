//! MIDI utilities and message types
//!
//! The pedal only speaks note messages, but inbound traffic from a looper
//! host can contain anything, so parsing recognizes every channel voice
//! message and lets the dispatcher ignore what it does not need.

use std::fmt;

/// MIDI message types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Note Off: channel (0-15), note (0-127), velocity (0-127)
    NoteOff { channel: u8, note: u8, velocity: u8 },

    /// Note On: channel (0-15), note (0-127), velocity (1-127)
    NoteOn { channel: u8, note: u8, velocity: u8 },

    /// Control Change: channel (0-15), cc (0-127), value (0-127)
    ControlChange { channel: u8, cc: u8, value: u8 },

    /// Program Change: channel (0-15), program (0-127)
    ProgramChange { channel: u8, program: u8 },

    /// Any other channel voice message (aftertouch, pitch bend)
    Other { status: u8 },
}

impl MidiMessage {
    /// Parse a MIDI message from raw bytes
    ///
    /// System messages (0xF0 and above) and running status are not
    /// supported and yield `None`.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let status = *data.first()?;

        if !(0x80..0xF0).contains(&status) {
            return None;
        }

        let channel = status & 0x0F;
        let data1 = data.get(1).map(|b| b & 0x7F);
        let data2 = data.get(2).map(|b| b & 0x7F);

        match status & 0xF0 {
            0x80 => Some(MidiMessage::NoteOff {
                channel,
                note: data1?,
                velocity: data2?,
            }),
            0x90 => {
                // Note On (velocity 0 = Note Off)
                let note = data1?;
                let velocity = data2?;
                if velocity == 0 {
                    Some(MidiMessage::NoteOff { channel, note, velocity: 0 })
                } else {
                    Some(MidiMessage::NoteOn { channel, note, velocity })
                }
            }
            0xB0 => Some(MidiMessage::ControlChange {
                channel,
                cc: data1?,
                value: data2?,
            }),
            0xC0 => Some(MidiMessage::ProgramChange {
                channel,
                program: data1?,
            }),
            _ => Some(MidiMessage::Other { status }),
        }
    }

    /// Encode the message to MIDI bytes
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                vec![0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                vec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                vec![0xB0 | (channel & 0x0F), cc & 0x7F, value & 0x7F]
            }
            MidiMessage::ProgramChange { channel, program } => {
                vec![0xC0 | (channel & 0x0F), program & 0x7F]
            }
            MidiMessage::Other { status } => vec![status],
        }
    }

    /// Get the channel (0-15)
    pub fn channel(&self) -> u8 {
        match *self {
            MidiMessage::NoteOff { channel, .. }
            | MidiMessage::NoteOn { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::ProgramChange { channel, .. } => channel,
            MidiMessage::Other { status } => status & 0x0F,
        }
    }
}

impl fmt::Display for MidiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MidiMessage::NoteOff { channel, note, velocity } => {
                write!(f, "NoteOff ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::NoteOn { channel, note, velocity } => {
                write!(f, "NoteOn ch:{} n:{} v:{}", channel + 1, note, velocity)
            }
            MidiMessage::ControlChange { channel, cc, value } => {
                write!(f, "CC ch:{} cc:{} v:{}", channel + 1, cc, value)
            }
            MidiMessage::ProgramChange { channel, program } => {
                write!(f, "ProgramChange ch:{} p:{}", channel + 1, program)
            }
            MidiMessage::Other { status } => write!(f, "Status {:02X}", status),
        }
    }
}

/// Format MIDI bytes as hex string for debugging
pub fn format_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on_parsing() {
        let data = vec![0x90, 41, 127]; // Note On, ch 1, F1, velocity 127
        let msg = MidiMessage::parse(&data).unwrap();

        assert_eq!(msg, MidiMessage::NoteOn {
            channel: 0,
            note: 41,
            velocity: 127,
        });
    }

    #[test]
    fn test_note_on_velocity_zero() {
        let data = vec![0x90, 40, 0]; // Note On with velocity 0 = Note Off
        let msg = MidiMessage::parse(&data).unwrap();

        assert_eq!(msg, MidiMessage::NoteOff {
            channel: 0,
            note: 40,
            velocity: 0,
        });
    }

    #[test]
    fn test_truncated_messages() {
        assert_eq!(MidiMessage::parse(&[]), None);
        assert_eq!(MidiMessage::parse(&[0x90, 40]), None);
        assert_eq!(MidiMessage::parse(&[0xC0]), None);
    }

    #[test]
    fn test_system_and_running_status_ignored() {
        assert_eq!(MidiMessage::parse(&[0xF8]), None); // Timing clock
        assert_eq!(MidiMessage::parse(&[0xF0, 0x7E, 0xF7]), None); // SysEx
        assert_eq!(MidiMessage::parse(&[40, 127]), None); // Running status
    }

    #[test]
    fn test_other_channel_messages() {
        let msg = MidiMessage::parse(&[0xE3, 0x00, 0x40]).unwrap(); // Pitch bend ch 4
        assert_eq!(msg, MidiMessage::Other { status: 0xE3 });
        assert_eq!(msg.channel(), 3);
    }

    #[test]
    fn test_encode_note_messages() {
        let on = MidiMessage::NoteOn { channel: 0, note: 43, velocity: 127 };
        let off = MidiMessage::NoteOff { channel: 2, note: 43, velocity: 127 };

        assert_eq!(on.encode(), vec![0x90, 43, 127]);
        assert_eq!(off.encode(), vec![0x82, 43, 127]);
    }

    #[test]
    fn test_display() {
        let msg = MidiMessage::NoteOn { channel: 0, note: 53, velocity: 127 };
        assert_eq!(msg.to_string(), "NoteOn ch:1 n:53 v:127");
        assert_eq!(format_hex(&msg.encode()), "90 35 7F");
    }
}
