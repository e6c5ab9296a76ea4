//! Input dispatch - button timing policy and inbound MIDI
//!
//! Every poll reads all nine buttons in wiring order and then takes at most
//! one message from the MIDI inbox. A button acts on its press edge and is
//! latched until released; release sends a note-off.
//!
//! Transport and Mode share a double-press window: the first press acts and
//! starts a timer, a later press acts again only once the window has
//! elapsed, and that second action resets the timer. Releasing never
//! touches the timer.
//!
//! Track buttons held past the long-press threshold unlatch themselves (the
//! next poll with the button still down is a new press) and, in
//! RecordSelect mode, undo the track.

use std::time::Duration;
use tracing::{debug, trace};

use super::{ControlMode, Pedal};
use crate::clock::Clock;
use crate::config::ReleaseNoteOff;
use crate::io::{Button, ButtonInput, Indicators, MidiPort};
use crate::midi::MidiMessage;
use crate::notes::InboundAction;

/// Latch and release bookkeeping for one button
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ButtonRuntime {
    /// Held and already acted on
    pub latched: bool,
    /// Last note sent while handling this button
    pub active_note: Option<u8>,
}

/// Double-press gate shared by Transport and Mode
///
/// Returns whether the press should act, updating the timer.
fn gate_press(timer: &mut Option<Duration>, now: Duration, window: Duration) -> bool {
    match *timer {
        None => {
            *timer = Some(now);
            true
        }
        Some(started) if now.saturating_sub(started) >= window => {
            *timer = None;
            true
        }
        Some(_) => false,
    }
}

impl<B, L, M, C> Pedal<B, L, M, C>
where
    B: ButtonInput,
    L: Indicators,
    M: MidiPort,
    C: Clock,
{
    /// One iteration of the control loop
    pub fn poll(&mut self) {
        for button in Button::ALL {
            self.poll_button(button);
        }
        self.poll_midi();
    }

    fn poll_button(&mut self, button: Button) {
        // Wired but intentionally unbound
        if button == Button::Undo {
            return;
        }

        let pressed = self.buttons.is_pressed(button);
        let latched = self.controls[button.index()].latched;

        match (pressed, latched) {
            (true, false) => {
                self.controls[button.index()].latched = true;
                self.track_notes_for(button, |pedal| pedal.on_press(button));
            }
            (true, true) => self.track_notes_for(button, |pedal| pedal.on_hold(button)),
            (false, true) => self.on_release(button),
            (false, false) => {}
        }
    }

    /// Run `action` and remember the last note it sent as this button's
    /// active note
    fn track_notes_for(&mut self, button: Button, action: impl FnOnce(&mut Self)) {
        let before = self.notes_sent;
        action(self);
        if self.notes_sent != before {
            self.controls[button.index()].active_note = self.last_note;
        }
    }

    fn on_press(&mut self, button: Button) {
        trace!("{:?} pressed", button);
        let now = self.clock.now();

        match button {
            Button::Clear => self.clear(),
            Button::Transport => {
                let window = self.timing.transport_window();
                if gate_press(&mut self.transport_timer, now, window) {
                    self.next_state();
                } else {
                    debug!("Transport press inside {:?} window ignored", window);
                }
            }
            Button::Stop => self.stop(),
            Button::Undo => {}
            Button::Mode => {
                let window = self.timing.mode_window();
                if gate_press(&mut self.mode_timer, now, window) {
                    self.change_mode(None, true);
                } else {
                    debug!("Mode press inside {:?} window ignored", window);
                }
            }
            Button::Track1 | Button::Track2 | Button::Track3 | Button::Track4 => {
                let Some(track) = button.track() else { return };
                self.hold_start = Some(now);
                match self.tracks.mode {
                    ControlMode::RecordSelect => self.select_track(track, true),
                    ControlMode::PlayMute => self.toggle_mute(track, true),
                }
            }
        }
    }

    fn on_hold(&mut self, button: Button) {
        let Some(track) = button.track() else { return };
        let Some(start) = self.hold_start else { return };

        let held = self.clock.now().saturating_sub(start);
        if held < self.timing.long_press() {
            return;
        }

        debug!("Track {} held for {:?}", track, held);
        self.controls[button.index()].latched = false;
        if self.tracks.mode == ControlMode::RecordSelect {
            self.undo_track(track);
        }
    }

    fn on_release(&mut self, button: Button) {
        trace!("{:?} released", button);
        let runtime = &mut self.controls[button.index()];
        runtime.latched = false;

        let note = match self.release_note_off {
            ReleaseNoteOff::LastSent => self.last_note,
            ReleaseNoteOff::PerControl => runtime.active_note.take(),
        };
        if let Some(note) = note {
            self.send_note_off(note);
        }
    }

    /// Handle at most one inbound message
    fn poll_midi(&mut self) {
        let Some(message) = self.midi.try_receive() else { return };
        debug!("📥 {}", message);

        let MidiMessage::NoteOn { channel, note, .. } = message else {
            return;
        };
        if channel != self.channel {
            trace!("Ignoring note {} on channel {}", note, channel + 1);
            return;
        }

        for action in self.notes.inbound_actions(note) {
            match action {
                InboundAction::Clear => self.clear(),
                InboundAction::NextState => self.next_state(),
                InboundAction::Stop => self.stop(),
                InboundAction::ChangeMode => self.change_mode(None, true),
                InboundAction::SelectTrack(track) => self.select_track(track, true),
                InboundAction::ToggleMute(track) => self.toggle_mute(track, false),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    #[test]
    fn test_first_press_acts_and_starts_timer() {
        let mut timer = None;
        assert!(gate_press(&mut timer, Duration::from_secs(3), WINDOW));
        assert_eq!(timer, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_press_inside_window_is_swallowed() {
        let mut timer = Some(Duration::from_secs(3));
        assert!(!gate_press(&mut timer, Duration::from_millis(3499), WINDOW));
        assert_eq!(timer, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_press_after_window_acts_and_resets() {
        let mut timer = Some(Duration::from_secs(3));
        assert!(gate_press(&mut timer, Duration::from_millis(3500), WINDOW));
        assert_eq!(timer, None);

        // Next press starts afresh
        assert!(gate_press(&mut timer, Duration::from_millis(3600), WINDOW));
        assert_eq!(timer, Some(Duration::from_millis(3600)));
    }
}
