//! Looper Pedal - foot-pedal MIDI controller for a four-track looper
//!
//! Nine buttons and twelve lamps on one side, a MIDI port to the looper on
//! the other. The [`pedal::Pedal`] state machine mirrors the looper's
//! transport state, track selection and mute flags, turns button presses
//! into notes and follows the looper's own notes coming back in.

pub mod clock;
pub mod config;
pub mod error;
pub mod io;
pub mod midi;
pub mod notes;
pub mod pedal;

pub use config::AppConfig;
pub use error::PedalError;
pub use pedal::Pedal;
