//! Track selection, control mode, mute and undo

use tracing::{info, warn};

use super::{LooperState, Pedal, TRACK_COUNT};
use crate::clock::Clock;
use crate::io::{ButtonInput, Indicators, Lamp, MidiPort};
use crate::notes::TrackNote;

/// What the four track buttons do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    /// Track buttons select; red selection lamps shown
    #[default]
    RecordSelect,
    /// Track buttons toggle mute; green lamps show unmuted tracks
    PlayMute,
}

impl ControlMode {
    pub fn toggled(self) -> ControlMode {
        match self {
            ControlMode::RecordSelect => ControlMode::PlayMute,
            ControlMode::PlayMute => ControlMode::RecordSelect,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Track {
    pub muted: bool,
}

/// Mode, selection and the four tracks
///
/// Tracks are addressed by number 1..=4 everywhere outside this type.
#[derive(Debug, Clone)]
pub struct TrackSet {
    pub mode: ControlMode,
    selected: usize,
    tracks: [Track; TRACK_COUNT],
}

impl TrackSet {
    pub fn new() -> Self {
        Self {
            mode: ControlMode::RecordSelect,
            selected: 1,
            tracks: [Track::default(); TRACK_COUNT],
        }
    }

    /// Array slot for a track number
    pub fn slot(track: usize) -> Option<usize> {
        (1..=TRACK_COUNT).contains(&track).then(|| track - 1)
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn is_muted(&self, track: usize) -> bool {
        Self::slot(track)
            .map(|slot| self.tracks[slot].muted)
            .unwrap_or(false)
    }

    pub fn muted_tracks(&self) -> Vec<usize> {
        (1..=TRACK_COUNT).filter(|&t| self.is_muted(t)).collect()
    }

    fn set_selected(&mut self, track: usize) {
        if Self::slot(track).is_some() {
            self.selected = track;
        }
    }

    pub(super) fn set_muted(&mut self, track: usize, muted: bool) {
        if let Some(slot) = Self::slot(track) {
            self.tracks[slot].muted = muted;
        }
    }
}

impl Default for TrackSet {
    fn default() -> Self {
        Self::new()
    }
}

impl<B, L, M, C> Pedal<B, L, M, C>
where
    B: ButtonInput,
    L: Indicators,
    M: MidiPort,
    C: Clock,
{
    /// Make `track` the selected track, optionally telling the looper
    pub fn select_track(&mut self, track: usize, send_note: bool) {
        if TrackSet::slot(track).is_none() {
            warn!("Ignoring select for unknown track {}", track);
            return;
        }

        self.tracks.set_selected(track);
        self.refresh_select_lamps();

        if send_note {
            let note = self.notes.track_note(track, TrackNote::Select);
            self.send_note(note, true);
        }
        info!("Select TRACK {}", track);
    }

    /// Switch control mode; `None` toggles
    pub fn change_mode(&mut self, target: Option<ControlMode>, send_note: bool) {
        self.tracks.mode = target.unwrap_or_else(|| self.tracks.mode.toggled());

        self.refresh_select_lamps();
        self.refresh_mute_lamps();

        if send_note {
            self.send_note(self.notes.mode_change(), true);
        }

        match self.tracks.mode {
            ControlMode::RecordSelect => info!("REC MODE"),
            ControlMode::PlayMute => info!("PLAY MODE"),
        }
    }

    /// Flip the mute flag of `track`
    ///
    /// The outgoing note is note-on only; the button release provides the
    /// note-off. Echoes of the looper's own mute notes pass `send_note =
    /// false`.
    pub fn toggle_mute(&mut self, track: usize, send_note: bool) {
        let Some(slot) = TrackSet::slot(track) else {
            warn!("Ignoring mute for unknown track {}", track);
            return;
        };

        if send_note {
            let note = self.notes.track_note(track, TrackNote::MuteToggle);
            self.send_note(note, false);
        }

        let muted = !self.tracks.is_muted(track);
        self.tracks.set_muted(track, muted);

        if self.tracks.mode == ControlMode::PlayMute {
            self.lamps.set(Lamp::Mute(slot), !muted);
        }
        info!("TRACK {} muted = {}", track, muted);
    }

    /// Undo the last layer on `track`
    ///
    /// The looper track is forced into play, given time to settle, then
    /// sent undo; while overdubbing it is put back into overdub afterwards.
    /// The selection lamp blinks across the second pause and the track
    /// ends up selected.
    pub fn undo_track(&mut self, track: usize) {
        if self.state == LooperState::None {
            return;
        }
        let Some(slot) = TrackSet::slot(track) else {
            warn!("Ignoring undo for unknown track {}", track);
            return;
        };

        let note = self.notes.track_note(track, TrackNote::ForcePlay);
        self.send_note(note, true);
        self.clock.sleep(self.timing.undo_settle());

        let note = self.notes.track_note(track, TrackNote::Undo);
        self.send_note(note, true);
        self.lamps.set(Lamp::Select(slot), false);
        self.clock.sleep(self.timing.undo_blink());
        self.lamps.set(Lamp::Select(slot), true);

        if self.state == LooperState::Overdub {
            let note = self.notes.track_note(track, TrackNote::ForceOverdub);
            self.send_note(note, true);
        }

        info!("UNDO TRACK {}", track);
        self.select_track(track, true);
    }

    /// Red lamps: only the selected track, only in RecordSelect
    fn refresh_select_lamps(&mut self) {
        let lit = match self.tracks.mode {
            ControlMode::RecordSelect => TrackSet::slot(self.tracks.selected()),
            ControlMode::PlayMute => None,
        };
        for slot in 0..TRACK_COUNT {
            self.lamps.set(Lamp::Select(slot), lit == Some(slot));
        }
    }

    /// Green lamps: every unmuted track, only in PlayMute
    fn refresh_mute_lamps(&mut self) {
        let shown = self.tracks.mode == ControlMode::PlayMute;
        for track in 1..=TRACK_COUNT {
            let lit = shown && !self.tracks.is_muted(track);
            self.lamps.set(Lamp::Mute(track - 1), lit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_translation() {
        assert_eq!(TrackSet::slot(0), None);
        assert_eq!(TrackSet::slot(1), Some(0));
        assert_eq!(TrackSet::slot(4), Some(3));
        assert_eq!(TrackSet::slot(5), None);
    }

    #[test]
    fn test_track_set_defaults() {
        let tracks = TrackSet::default();
        assert_eq!(tracks.mode, ControlMode::RecordSelect);
        assert_eq!(tracks.selected(), 1);
        assert!(tracks.muted_tracks().is_empty());
    }

    #[test]
    fn test_mute_flags_are_independent() {
        let mut tracks = TrackSet::new();
        tracks.set_muted(2, true);
        tracks.set_muted(4, true);
        tracks.set_muted(9, true);

        assert_eq!(tracks.muted_tracks(), vec![2, 4]);
        assert!(!tracks.is_muted(9));
    }

    #[test]
    fn test_mode_toggle() {
        assert_eq!(ControlMode::RecordSelect.toggled(), ControlMode::PlayMute);
        assert_eq!(ControlMode::PlayMute.toggled(), ControlMode::RecordSelect);
    }
}
