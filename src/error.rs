//! Typed errors for the edges of the pedal (configuration and backends)
//!
//! The state machine itself never fails; these only surface while building
//! a [`crate::pedal::Pedal`] or opening its hardware.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PedalError {
    #[error("note '{name}' resolves to {value}, outside the MIDI range 0-127")]
    NoteOutOfRange { name: String, value: u16 },

    #[error("notes '{first}' and '{second}' both resolve to {note}")]
    NoteCollision {
        first: String,
        second: String,
        note: u8,
    },

    #[error("MIDI {direction} port matching '{pattern}' not found")]
    PortNotFound {
        direction: &'static str,
        pattern: String,
    },

    #[error("{group} needs {expected} pins, got {actual}")]
    PinCount {
        group: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("pin {pin} is assigned more than once")]
    DuplicatePin { pin: u8 },

    #[error("GPIO backend requested but looper-pedal was built without the `gpio` feature")]
    GpioUnavailable,
}
