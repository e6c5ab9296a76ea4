//! Hardware-less backend - logs lamp changes for running without a pedal
//!
//! This is useful for:
//! - Driving the pedal logic purely from a looper host's MIDI output
//! - Checking the lamp choreography on a desktop
//! - Development without GPIO hardware

use std::collections::HashMap;
use tracing::{debug, info};

use super::{Button, ButtonInput, Indicators, Lamp};

/// Buttons that are never pressed
#[derive(Debug, Default)]
pub struct IdleButtons;

impl ButtonInput for IdleButtons {
    fn is_pressed(&mut self, _button: Button) -> bool {
        false
    }
}

/// Lamps that only exist in the log
///
/// Repeated writes of the same level are collapsed so the log shows real
/// transitions only.
#[derive(Debug, Default)]
pub struct LogIndicators {
    levels: HashMap<Lamp, bool>,
}

impl LogIndicators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_lit(&self, lamp: Lamp) -> bool {
        self.levels.get(&lamp).copied().unwrap_or(false)
    }
}

impl Indicators for LogIndicators {
    fn set(&mut self, lamp: Lamp, lit: bool) {
        let previous = self.levels.insert(lamp, lit);
        if previous == Some(lit) {
            return;
        }

        match lamp {
            Lamp::Status(slot) => info!("💡 status lamp {} {}", slot, on_off(lit)),
            Lamp::Select(slot) | Lamp::Mute(slot) => {
                debug!("💡 {:?} lamp track {} {}", lamp, slot + 1, on_off(lit))
            }
        }
    }
}

fn on_off(lit: bool) -> &'static str {
    if lit { "on" } else { "off" }
}
