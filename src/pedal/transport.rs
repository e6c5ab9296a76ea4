//! Looper transport state machine and Clear

use tracing::info;

use super::{ControlMode, Pedal, STATUS_LAMP_COUNT, TRACK_COUNT};
use crate::clock::Clock;
use crate::io::{ButtonInput, Indicators, Lamp, MidiPort};
use crate::notes::TrackNote;

/// Transport state of the external looper, as tracked by the pedal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LooperState {
    /// Nothing recorded since the last Clear
    #[default]
    None,
    Record,
    Overdub,
    Play,
    Stop,
}

impl LooperState {
    pub const ALL: [LooperState; 5] = [
        LooperState::None,
        LooperState::Record,
        LooperState::Overdub,
        LooperState::Play,
        LooperState::Stop,
    ];

    /// Where the transport button goes from here
    pub fn successor(self) -> LooperState {
        match self {
            LooperState::None => LooperState::Record,
            LooperState::Record => LooperState::Overdub,
            LooperState::Overdub => LooperState::Play,
            LooperState::Play => LooperState::Overdub,
            LooperState::Stop => LooperState::Play,
        }
    }

    /// Status lamp for this state; None has no lamp
    pub fn status_slot(self) -> Option<usize> {
        match self {
            LooperState::None => None,
            LooperState::Record => Some(0),
            LooperState::Overdub => Some(1),
            LooperState::Play => Some(2),
            LooperState::Stop => Some(3),
        }
    }

    fn label(self) -> &'static str {
        match self {
            LooperState::None => "RESET",
            LooperState::Record => "REC",
            LooperState::Overdub => "OVERDUB",
            LooperState::Play => "PLAY",
            LooperState::Stop => "STOP",
        }
    }
}

impl<B, L, M, C> Pedal<B, L, M, C>
where
    B: ButtonInput,
    L: Indicators,
    M: MidiPort,
    C: Clock,
{
    /// Advance the transport: None -> Record -> Overdub <-> Play, Stop -> Play
    ///
    /// The transport note always goes out first (note-on only), so the
    /// looper follows even when the request came in over MIDI.
    pub fn next_state(&mut self) {
        self.send_note(self.notes.transport, false);

        let now = self.clock.now();
        let previous = self.state;
        self.set_state(previous.successor());

        match previous {
            LooperState::None => self.loop_start = Some(now),
            LooperState::Record if self.capture_loop_length => {
                self.capture_loop_length = false;
                let length = now.saturating_sub(self.loop_start.unwrap_or_default());
                self.loop_length = Some(length);
                info!("Loop length = {:.3}s", length.as_secs_f64());
            }
            _ => {}
        }
    }

    /// Stop every looper track; ignored before anything was recorded
    pub fn stop(&mut self) {
        if self.state == LooperState::None {
            return;
        }

        self.set_state(LooperState::Stop);
        self.send_note(self.notes.stop, true);
        info!("STOP ALL");
    }

    /// Assign the state and light its status lamp
    pub fn set_state(&mut self, state: LooperState) {
        self.state = state;

        let lit = state.status_slot();
        for slot in 0..STATUS_LAMP_COUNT {
            self.lamps.set(Lamp::Status(slot), lit == Some(slot));
        }

        if state != LooperState::Stop {
            info!("{}", state.label());
        }
    }

    /// Full reset of pedal and looper
    ///
    /// Stops the looper, sends Clear, reselects track 1 in RecordSelect
    /// mode and unmutes every muted track. All status lamps stay lit for
    /// the clear hold, then the state drops to None.
    pub fn clear(&mut self) {
        self.transport_timer = None;
        self.mode_timer = None;
        self.loop_start = None;
        self.loop_length = None;
        self.capture_loop_length = true;

        self.stop();
        self.send_note(self.notes.clear, true);
        info!("CLEAR");

        for slot in 0..TRACK_COUNT {
            self.lamps.set(Lamp::Select(slot), false);
            self.lamps.set(Lamp::Mute(slot), false);
        }
        for slot in 0..STATUS_LAMP_COUNT {
            self.lamps.set(Lamp::Status(slot), true);
        }

        self.select_track(1, true);
        self.change_mode(Some(ControlMode::RecordSelect), false);

        for track in 1..=TRACK_COUNT {
            if self.tracks.is_muted(track) {
                let note = self.notes.track_note(track, TrackNote::MuteToggle);
                self.send_note(note, true);
                self.tracks.set_muted(track, false);
            }
        }

        self.clock.sleep(self.timing.clear_hold());
        self.set_state(LooperState::None);
    }
}
