//! Hardware capabilities the pedal core drives
//!
//! The core never touches pins or ports directly. It reads button levels,
//! sets lamps and exchanges MIDI through these traits, and the binary picks
//! a backend for each from the configuration.

use anyhow::Result;

use crate::midi::MidiMessage;

pub mod console;
#[cfg(feature = "gpio")]
pub mod gpio;
pub mod midir_port;

pub use console::{IdleButtons, LogIndicators};
#[cfg(feature = "gpio")]
pub use gpio::{GpioButtons, GpioLamps};
pub use midir_port::MidirPort;

/// The nine physical controls, in wiring order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Clear,
    Transport,
    Stop,
    /// Wired but not bound to any action
    Undo,
    Mode,
    Track1,
    Track2,
    Track3,
    Track4,
}

impl Button {
    pub const ALL: [Button; 9] = [
        Button::Clear,
        Button::Transport,
        Button::Stop,
        Button::Undo,
        Button::Mode,
        Button::Track1,
        Button::Track2,
        Button::Track3,
        Button::Track4,
    ];

    /// Wiring position 0..=8
    pub fn index(self) -> usize {
        self as usize
    }

    /// Track number 1..=4 for the track buttons
    pub fn track(self) -> Option<usize> {
        match self {
            Button::Track1 => Some(1),
            Button::Track2 => Some(2),
            Button::Track3 => Some(3),
            Button::Track4 => Some(4),
            _ => None,
        }
    }
}

/// One lamp on the pedal; slots are 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lamp {
    /// 0 Record, 1 Overdub, 2 Play, 3 Stop
    Status(usize),
    /// Selection lamp for track slot (red)
    Select(usize),
    /// Unmuted lamp for track slot (green)
    Mute(usize),
}

/// Debounced, pull-up normalized button levels
pub trait ButtonInput {
    /// True while the control is held down
    fn is_pressed(&mut self, button: Button) -> bool;
}

/// Indicator lamp output
pub trait Indicators {
    fn set(&mut self, lamp: Lamp, lit: bool);
}

/// Outgoing and incoming MIDI
pub trait MidiPort {
    fn send(&mut self, message: &MidiMessage) -> Result<()>;

    /// Next pending inbound message, without blocking
    fn try_receive(&mut self) -> Option<MidiMessage>;
}

impl<T: ButtonInput + ?Sized> ButtonInput for Box<T> {
    fn is_pressed(&mut self, button: Button) -> bool {
        (**self).is_pressed(button)
    }
}

impl<T: Indicators + ?Sized> Indicators for Box<T> {
    fn set(&mut self, lamp: Lamp, lit: bool) {
        (**self).set(lamp, lit)
    }
}

impl<T: MidiPort + ?Sized> MidiPort for Box<T> {
    fn send(&mut self, message: &MidiMessage) -> Result<()> {
        (**self).send(message)
    }

    fn try_receive(&mut self) -> Option<MidiMessage> {
        (**self).try_receive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_wiring_order() {
        for (position, button) in Button::ALL.iter().enumerate() {
            assert_eq!(button.index(), position);
        }
        assert_eq!(Button::Undo.index(), 3);
    }

    #[test]
    fn test_track_buttons() {
        let tracks: Vec<usize> = Button::ALL.iter().filter_map(|b| b.track()).collect();
        assert_eq!(tracks, vec![1, 2, 3, 4]);
        assert_eq!(Button::Mode.track(), None);
    }
}
