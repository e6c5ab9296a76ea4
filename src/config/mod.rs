//! Configuration management for the looper pedal
//!
//! Handles loading, parsing and validation of the YAML configuration file.
//! Every field has a default matching the stock pedal, so an empty file (or
//! no file at all) gives the factory behavior.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tokio::fs;

use crate::error::PedalError;
use crate::notes::NoteMap;
use crate::pedal::{BUTTON_COUNT, STATUS_LAMP_COUNT, TRACK_COUNT};

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub midi: MidiConfig,
    #[serde(default)]
    pub notes: NoteMap,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub io: IoConfig,
    #[serde(default)]
    pub release_note_off: ReleaseNoteOff,
}

/// MIDI port configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MidiConfig {
    /// Substring of the input port name (case-insensitive)
    #[serde(default = "default_port_pattern")]
    pub input_port: String,
    /// Substring of the output port name (case-insensitive)
    #[serde(default = "default_port_pattern")]
    pub output_port: String,
    /// MIDI channel 1-16
    #[serde(default = "default_channel")]
    pub channel: u8,
    #[serde(default = "default_velocity")]
    pub velocity: u8,
}

impl Default for MidiConfig {
    fn default() -> Self {
        Self {
            input_port: default_port_pattern(),
            output_port: default_port_pattern(),
            channel: default_channel(),
            velocity: default_velocity(),
        }
    }
}

/// Press windows, hold thresholds and the deliberate pauses
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    /// Transport double-press window; the Mode window is half of it
    #[serde(default = "default_double_press_ms")]
    pub double_press_ms: u64,
    #[serde(default = "default_long_press_ms")]
    pub long_press_ms: u64,
    #[serde(default = "default_clear_hold_ms")]
    pub clear_hold_ms: u64,
    #[serde(default = "default_undo_settle_ms")]
    pub undo_settle_ms: u64,
    #[serde(default = "default_undo_blink_ms")]
    pub undo_blink_ms: u64,
    #[serde(default = "default_boot_step_ms")]
    pub boot_step_ms: u64,
    #[serde(default = "default_poll_interval_us")]
    pub poll_interval_us: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            double_press_ms: default_double_press_ms(),
            long_press_ms: default_long_press_ms(),
            clear_hold_ms: default_clear_hold_ms(),
            undo_settle_ms: default_undo_settle_ms(),
            undo_blink_ms: default_undo_blink_ms(),
            boot_step_ms: default_boot_step_ms(),
            poll_interval_us: default_poll_interval_us(),
        }
    }
}

impl TimingConfig {
    pub fn transport_window(&self) -> Duration {
        Duration::from_millis(self.double_press_ms)
    }

    pub fn mode_window(&self) -> Duration {
        self.transport_window() / 2
    }

    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn clear_hold(&self) -> Duration {
        Duration::from_millis(self.clear_hold_ms)
    }

    pub fn undo_settle(&self) -> Duration {
        Duration::from_millis(self.undo_settle_ms)
    }

    pub fn undo_blink(&self) -> Duration {
        Duration::from_millis(self.undo_blink_ms)
    }

    pub fn boot_step(&self) -> Duration {
        Duration::from_millis(self.boot_step_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_micros(self.poll_interval_us)
    }
}

/// Which hardware drives the buttons and lamps
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Raspberry Pi GPIO (requires the `gpio` feature)
    #[default]
    Gpio,
    /// No physical controls; lamps are logged. The pedal follows MIDI only.
    None,
}

/// Pin assignment (BCM numbering)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IoConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Clear, Transport, Stop, Undo, Mode, Track 1-4
    #[serde(default = "default_button_pins")]
    pub buttons: Vec<u8>,
    /// Record, Overdub, Play, Stop
    #[serde(default = "default_status_pins")]
    pub status_lamps: Vec<u8>,
    /// Selection lamp per track (red)
    #[serde(default = "default_select_pins")]
    pub select_lamps: Vec<u8>,
    /// Unmuted lamp per track (green)
    #[serde(default = "default_mute_pins")]
    pub mute_lamps: Vec<u8>,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            buttons: default_button_pins(),
            status_lamps: default_status_pins(),
            select_lamps: default_select_pins(),
            mute_lamps: default_mute_pins(),
        }
    }
}

/// Which note a released button turns off
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseNoteOff {
    /// Whatever note the pedal sent last, from any control
    #[default]
    LastSent,
    /// The last note sent while handling this control's press
    PerControl,
}

impl AppConfig {
    /// Load configuration from file with validation
    pub async fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config = Self::from_yaml(&contents)
            .with_context(|| format!("Invalid config file: {}", path))?;

        Ok(config)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self> {
        // An empty document deserializes as unit, not as an empty map
        let config: AppConfig = if contents.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(contents).context("Failed to parse YAML config")?
        };

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, path: &str) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .context("Failed to serialize config to YAML")?;

        fs::write(path, yaml)
            .await
            .with_context(|| format!("Failed to write config file: {}", path))?;

        Ok(())
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.midi.channel == 0 || self.midi.channel > 16 {
            anyhow::bail!("MIDI channel {} is invalid (must be 1-16)", self.midi.channel);
        }
        if self.midi.velocity == 0 || self.midi.velocity > 127 {
            anyhow::bail!("MIDI velocity {} is invalid (must be 1-127)", self.midi.velocity);
        }

        self.notes.validate().context("Invalid note map")?;

        if self.timing.double_press_ms == 0 {
            anyhow::bail!("timing.double_press_ms must be greater than 0");
        }
        if self.timing.long_press_ms == 0 {
            anyhow::bail!("timing.long_press_ms must be greater than 0");
        }

        self.io.validate().context("Invalid io section")?;

        Ok(())
    }
}

impl IoConfig {
    fn validate(&self) -> Result<(), PedalError> {
        let groups: [(&'static str, &Vec<u8>, usize); 4] = [
            ("buttons", &self.buttons, BUTTON_COUNT),
            ("status_lamps", &self.status_lamps, STATUS_LAMP_COUNT),
            ("select_lamps", &self.select_lamps, TRACK_COUNT),
            ("mute_lamps", &self.mute_lamps, TRACK_COUNT),
        ];

        let mut seen = HashSet::new();
        for (group, pins, expected) in groups {
            if pins.len() != expected {
                return Err(PedalError::PinCount {
                    group,
                    expected,
                    actual: pins.len(),
                });
            }
            for pin in pins {
                if !seen.insert(*pin) {
                    return Err(PedalError::DuplicatePin { pin: *pin });
                }
            }
        }

        Ok(())
    }
}

// Default value functions
fn default_port_pattern() -> String { "looper".to_string() }
fn default_channel() -> u8 { 1 }
fn default_velocity() -> u8 { 127 }
fn default_double_press_ms() -> u64 { 500 }
fn default_long_press_ms() -> u64 { 2000 }
fn default_clear_hold_ms() -> u64 { 1000 }
fn default_undo_settle_ms() -> u64 { 100 }
fn default_undo_blink_ms() -> u64 { 500 }
fn default_boot_step_ms() -> u64 { 1250 }
fn default_poll_interval_us() -> u64 { 100 }
fn default_button_pins() -> Vec<u8> { vec![4, 17, 27, 22, 5, 6, 13, 19, 26] }
fn default_status_pins() -> Vec<u8> { vec![18, 23, 24, 25] }
fn default_select_pins() -> Vec<u8> { vec![12, 16, 20, 21] }
fn default_mute_pins() -> Vec<u8> { vec![7, 8, 9, 10] }

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AppConfig::from_yaml("").unwrap();

        assert_eq!(config.midi.channel, 1);
        assert_eq!(config.midi.velocity, 127);
        assert_eq!(config.notes, NoteMap::default());
        assert_eq!(config.timing.transport_window(), Duration::from_millis(500));
        assert_eq!(config.timing.mode_window(), Duration::from_millis(250));
        assert_eq!(config.timing.long_press(), Duration::from_secs(2));
        assert_eq!(config.io.backend, Backend::Gpio);
        assert_eq!(config.release_note_off, ReleaseNoteOff::LastSent);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let yaml = r#"
midi:
  output_port: "SooperLooper"
notes:
  clear: 60
timing:
  long_press_ms: 1500
io:
  backend: none
release_note_off: per_control
"#;
        let config = AppConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.midi.output_port, "SooperLooper");
        assert_eq!(config.midi.input_port, "looper");
        assert_eq!(config.notes.clear, 60);
        assert_eq!(config.notes.mode_change(), 58);
        assert_eq!(config.notes.transport, 41);
        assert_eq!(config.timing.long_press(), Duration::from_millis(1500));
        assert_eq!(config.timing.double_press_ms, 500);
        assert_eq!(config.io.backend, Backend::None);
        assert_eq!(config.io.buttons.len(), BUTTON_COUNT);
        assert_eq!(config.release_note_off, ReleaseNoteOff::PerControl);
    }

    #[test]
    fn test_invalid_channel() {
        let err = AppConfig::from_yaml("midi:\n  channel: 17\n").unwrap_err();
        assert!(err.to_string().contains("channel 17"));
    }

    #[test]
    fn test_note_collision_rejected() {
        let yaml = "notes:\n  transport: 38\n";
        let err = AppConfig::from_yaml(yaml).unwrap_err();
        assert!(format!("{:#}", err).contains("both resolve to 38"));
    }

    #[test]
    fn test_pin_validation() {
        let short = "io:\n  buttons: [1, 2, 3]\n";
        let err = AppConfig::from_yaml(short).unwrap_err();
        assert!(format!("{:#}", err).contains("buttons needs 9 pins, got 3"));

        let duplicate = "io:\n  mute_lamps: [4, 8, 9, 10]\n";
        let err = AppConfig::from_yaml(duplicate).unwrap_err();
        assert!(format!("{:#}", err).contains("pin 4 is assigned more than once"));
    }

    #[test]
    fn test_zero_windows_rejected() {
        assert!(AppConfig::from_yaml("timing:\n  double_press_ms: 0\n").is_err());
        assert!(AppConfig::from_yaml("timing:\n  long_press_ms: 0\n").is_err());
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("pedal.yaml");
        let path = path.to_string_lossy().to_string();

        let mut config = AppConfig::default();
        config.midi.input_port = "Loopy".to_string();
        config.timing.undo_blink_ms = 250;
        config.save(&path).await?;

        let loaded = AppConfig::load(&path).await?;
        assert_eq!(loaded.midi.input_port, "Loopy");
        assert_eq!(loaded.timing.undo_blink(), Duration::from_millis(250));

        Ok(())
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = AppConfig::load("/definitely/not/here.yaml").await.unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    proptest! {
        #[test]
        fn prop_channel_range(channel in 0u8..=255) {
            let mut config = AppConfig::default();
            config.midi.channel = channel;
            prop_assert_eq!(config.validate().is_ok(), (1..=16).contains(&channel));
        }
    }
}
