//! Raspberry Pi GPIO backend
//!
//! Buttons are wired to ground with the internal pull-ups enabled, so a
//! pressed button reads low. Lamps are driven active-high.

use anyhow::{Context, Result};
use rppal::gpio::{Gpio, InputPin, Level, OutputPin};
use tracing::info;

use super::{Button, ButtonInput, Indicators, Lamp};
use crate::config::IoConfig;

pub struct GpioButtons {
    pins: Vec<InputPin>,
}

impl GpioButtons {
    pub fn new(gpio: &Gpio, config: &IoConfig) -> Result<Self> {
        let pins = config
            .buttons
            .iter()
            .map(|&pin| {
                gpio.get(pin)
                    .map(|p| p.into_input_pullup())
                    .with_context(|| format!("Failed to claim button pin {}", pin))
            })
            .collect::<Result<Vec<_>>>()?;

        info!("Buttons on pins {:?}", config.buttons);
        Ok(Self { pins })
    }
}

impl ButtonInput for GpioButtons {
    fn is_pressed(&mut self, button: Button) -> bool {
        self.pins[button.index()].is_low()
    }
}

pub struct GpioLamps {
    status: Vec<OutputPin>,
    select: Vec<OutputPin>,
    mute: Vec<OutputPin>,
}

impl GpioLamps {
    pub fn new(gpio: &Gpio, config: &IoConfig) -> Result<Self> {
        let claim = |pins: &[u8]| -> Result<Vec<OutputPin>> {
            pins.iter()
                .map(|&pin| {
                    gpio.get(pin)
                        .map(|p| p.into_output_low())
                        .with_context(|| format!("Failed to claim lamp pin {}", pin))
                })
                .collect()
        };

        Ok(Self {
            status: claim(&config.status_lamps)?,
            select: claim(&config.select_lamps)?,
            mute: claim(&config.mute_lamps)?,
        })
    }
}

impl Indicators for GpioLamps {
    fn set(&mut self, lamp: Lamp, lit: bool) {
        let pin = match lamp {
            Lamp::Status(slot) => &mut self.status[slot],
            Lamp::Select(slot) => &mut self.select[slot],
            Lamp::Mute(slot) => &mut self.mute[slot],
        };
        pin.write(if lit { Level::High } else { Level::Low });
    }
}

/// Open the GPIO controller and claim every configured pin
pub fn open(config: &IoConfig) -> Result<(GpioButtons, GpioLamps)> {
    let gpio = Gpio::new().context("Failed to open GPIO")?;
    Ok((GpioButtons::new(&gpio, config)?, GpioLamps::new(&gpio, config)?))
}
