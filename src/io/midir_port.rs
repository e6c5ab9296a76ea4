//! MIDI transport to the looper host over midir
//!
//! Ports are matched by case-insensitive substring, which survives the
//! numbering prefixes ALSA and Windows add to port names. Inbound bytes are
//! parsed on midir's callback thread and queued for the poll loop.

use anyhow::{Context, Result};
use midir::{MidiIO, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::MidiPort;
use crate::error::PedalError;
use crate::midi::{format_hex, MidiMessage};

/// Inbound messages waiting for the poll loop
const INBOX_CAPACITY: usize = 256;

/// Connected input/output pair
pub struct MidirPort {
    output: MidiOutputConnection,
    /// Held to keep the input callback alive
    _input: MidiInputConnection<()>,
    inbox: mpsc::Receiver<MidiMessage>,
}

impl MidirPort {
    /// Connect to the first input and output ports whose names contain the
    /// given patterns
    pub fn connect(input_pattern: &str, output_pattern: &str) -> Result<Self> {
        info!(
            "Connecting to looper - Input: '{}', Output: '{}'",
            input_pattern, output_pattern
        );

        let midi_in = MidiInput::new("looper-pedal-input")
            .context("Failed to create MIDI input")?;
        debug!("Found {} MIDI input ports", midi_in.port_count());

        let (in_port, in_name) = find_port_by_substring(&midi_in, input_pattern)
            .ok_or_else(|| PedalError::PortNotFound {
                direction: "input",
                pattern: input_pattern.to_string(),
            })?;
        info!("Connecting to input port: {}", in_name);

        let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let input = midi_in
            .connect(
                &in_port,
                "looper-pedal",
                move |_timestamp, data, _| match MidiMessage::parse(data) {
                    Some(message) => {
                        trace!("MIDI RX {}", format_hex(data));
                        // Never block midir's thread; a full inbox drops the message
                        if tx.try_send(message).is_err() {
                            warn!("MIDI inbox full, dropping {}", message);
                        }
                    }
                    None => debug!("Failed to parse MIDI: {}", format_hex(data)),
                },
                (),
            )
            .map_err(|e| anyhow::anyhow!("{}", e))
            .context("Failed to connect to input port")?;

        let midi_out = MidiOutput::new("looper-pedal-output")
            .context("Failed to create MIDI output")?;
        debug!("Found {} MIDI output ports", midi_out.port_count());

        let (out_port, out_name) = find_port_by_substring(&midi_out, output_pattern)
            .ok_or_else(|| PedalError::PortNotFound {
                direction: "output",
                pattern: output_pattern.to_string(),
            })?;
        info!("Connecting to output port: {}", out_name);

        let output = midi_out
            .connect(&out_port, "looper-pedal")
            .map_err(|e| anyhow::anyhow!("{}", e))
            .context("Failed to connect to output port")?;

        info!("✅ MIDI connected");

        Ok(Self {
            output,
            _input: input,
            inbox,
        })
    }
}

impl MidiPort for MidirPort {
    fn send(&mut self, message: &MidiMessage) -> Result<()> {
        self.output
            .send(&message.encode())
            .with_context(|| format!("Failed to send {}", message))
    }

    fn try_receive(&mut self) -> Option<MidiMessage> {
        self.inbox.try_recv().ok()
    }
}

/// Find a port by case-insensitive substring match
pub fn find_port_by_substring<T: MidiIO>(io: &T, pattern: &str) -> Option<(T::Port, String)> {
    let pattern = pattern.to_lowercase();
    io.ports().into_iter().find_map(|port| {
        let name = io.port_name(&port).ok()?;
        if name.to_lowercase().contains(&pattern) {
            debug!("Found port '{}' matching pattern '{}'", name, pattern);
            Some((port, name))
        } else {
            None
        }
    })
}

fn port_names<T: MidiIO>(io: &T) -> Vec<String> {
    io.ports()
        .iter()
        .filter_map(|port| io.port_name(port).ok())
        .collect()
}

/// Print available MIDI ports (for `--list-ports`)
pub fn list_ports_formatted() -> Result<()> {
    use colored::*;

    println!("\n{}", "=== Available MIDI Ports ===".bold().cyan());

    let inputs = port_names(&MidiInput::new("looper-pedal-scanner")?);
    let outputs = port_names(&MidiOutput::new("looper-pedal-scanner")?);

    for (title, names) in [("Input Ports:", inputs), ("Output Ports:", outputs)] {
        println!("\n{}", title.bold());
        if names.is_empty() {
            println!("  {}", "No ports found".dimmed());
        }
        for name in names {
            println!("  {}", name.bright_white());
        }
    }
    println!();

    Ok(())
}
