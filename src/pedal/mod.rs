//! Pedal core - the state machine between buttons, MIDI and lamps
//!
//! A [`Pedal`] owns every piece of controller state: looper transport
//! state, control mode, track selection and mute flags, per-button latches
//! and press timers, and the last note sent. It is driven by [`Pedal::poll`]
//! once per loop iteration and mutates itself through `&mut self`, so there
//! is no locking anywhere in the core.
//!
//! The implementation is split by concern:
//! - `transport`: record / overdub / play / stop transitions and Clear
//! - `tracks`: track selection, control mode, mute and undo
//! - `dispatch`: per-button timing policy and inbound MIDI

mod dispatch;
mod tracks;
mod transport;


use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::config::{AppConfig, ReleaseNoteOff, TimingConfig};
use crate::io::{ButtonInput, Indicators, Lamp, MidiPort};
use crate::midi::MidiMessage;
use crate::notes::NoteMap;

use dispatch::ButtonRuntime;
pub use tracks::{ControlMode, Track, TrackSet};
pub use transport::LooperState;

/// Number of looper tracks the pedal addresses
pub const TRACK_COUNT: usize = 4;

/// Number of physical buttons
pub const BUTTON_COUNT: usize = 9;

/// Number of status lamps (Record, Overdub, Play, Stop)
pub const STATUS_LAMP_COUNT: usize = 4;

pub struct Pedal<B, L, M, C> {
    buttons: B,
    lamps: L,
    midi: M,
    clock: C,

    notes: NoteMap,
    timing: TimingConfig,
    /// Outbound and accepted inbound channel (0-15)
    channel: u8,
    velocity: u8,
    release_note_off: ReleaseNoteOff,

    state: LooperState,
    loop_start: Option<Duration>,
    loop_length: Option<Duration>,
    /// Only the first Record -> Overdub after a Clear measures the loop
    capture_loop_length: bool,

    tracks: TrackSet,

    controls: [ButtonRuntime; BUTTON_COUNT],
    transport_timer: Option<Duration>,
    mode_timer: Option<Duration>,
    /// Shared by all four track buttons
    hold_start: Option<Duration>,

    last_note: Option<u8>,
    notes_sent: u64,
}

impl<B, L, M, C> Pedal<B, L, M, C>
where
    B: ButtonInput,
    L: Indicators,
    M: MidiPort,
    C: Clock,
{
    /// Create a pedal in its power-on state
    ///
    /// Nothing is sent and no lamp is touched until [`Pedal::boot`] or
    /// [`Pedal::clear`] runs.
    pub fn new(config: &AppConfig, buttons: B, lamps: L, midi: M, clock: C) -> Self {
        Self {
            buttons,
            lamps,
            midi,
            clock,
            notes: config.notes.clone(),
            timing: config.timing.clone(),
            channel: config.midi.channel.saturating_sub(1),
            velocity: config.midi.velocity,
            release_note_off: config.release_note_off,
            state: LooperState::None,
            loop_start: None,
            loop_length: None,
            capture_loop_length: true,
            tracks: TrackSet::new(),
            controls: [ButtonRuntime::default(); BUTTON_COUNT],
            transport_timer: None,
            mode_timer: None,
            hold_start: None,
            last_note: None,
            notes_sent: 0,
        }
    }

    /// Power-on lamp sequence followed by a full Clear
    ///
    /// Each status lamp lights in turn, holding for the boot step, so the
    /// operator can see every lamp works before the pedal resets.
    pub fn boot(&mut self) {
        info!("Pedal booted");
        for slot in 0..STATUS_LAMP_COUNT {
            self.lamps.set(Lamp::Status(slot), true);
            self.clock.sleep(self.timing.boot_step());
        }
        self.clear();
        info!("Pedal ready");
    }

    /// Poll until a shutdown request arrives (or its sender is dropped)
    pub fn run(&mut self, shutdown: &mut oneshot::Receiver<()>) {
        let interval = self.timing.poll_interval();
        info!("Poll loop started ({:?} interval)", interval);

        loop {
            self.poll();

            match shutdown.try_recv() {
                Err(oneshot::error::TryRecvError::Empty) => {}
                _ => break,
            }

            self.clock.sleep(interval);
        }

        info!("Poll loop stopped");
    }

    pub fn state(&self) -> LooperState {
        self.state
    }

    pub fn mode(&self) -> ControlMode {
        self.tracks.mode
    }

    pub fn selected_track(&self) -> usize {
        self.tracks.selected()
    }

    pub fn is_muted(&self, track: usize) -> bool {
        self.tracks.is_muted(track)
    }

    /// Loop length measured on the first Record -> Overdub since Clear
    pub fn loop_length(&self) -> Option<Duration> {
        self.loop_length
    }

    pub fn last_note(&self) -> Option<u8> {
        self.last_note
    }

    pub fn buttons_mut(&mut self) -> &mut B {
        &mut self.buttons
    }

    pub fn lamps(&self) -> &L {
        &self.lamps
    }

    pub fn midi(&self) -> &M {
        &self.midi
    }

    pub fn midi_mut(&mut self) -> &mut M {
        &mut self.midi
    }

    /// Send a note-on, optionally followed by its note-off
    ///
    /// The note becomes the "last note" that a button release turns off.
    fn send_note(&mut self, note: u8, paired: bool) {
        self.transmit(MidiMessage::NoteOn {
            channel: self.channel,
            note,
            velocity: self.velocity,
        });
        self.last_note = Some(note);
        self.notes_sent += 1;

        if paired {
            self.send_note_off(note);
        }
    }

    fn send_note_off(&mut self, note: u8) {
        self.transmit(MidiMessage::NoteOff {
            channel: self.channel,
            note,
            velocity: self.velocity,
        });
    }

    /// One attempt per message; a failed send is logged and the state
    /// machine carries on
    fn transmit(&mut self, message: MidiMessage) {
        debug!("📤 {}", message);
        if let Err(e) = self.midi.send(&message) {
            warn!("MIDI send failed: {:#}", e);
        }
    }
}
