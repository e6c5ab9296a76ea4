//! Note map between logical pedal actions and MIDI note numbers
//!
//! Seven base notes (Clear, Transport, Stop, Track 1-4) cover everything the
//! pedal sends. Track-scoped sub-actions live at fixed offsets above each
//! track's base note, and the mode-change note sits two below Clear.
//!
//! ```text
//! CLEAR      E1 (40)
//! TRANSPORT  F1 (41)   record / overdub / play
//! STOP       G1 (43)
//! TRACK n    base +0 select, +1 undo, +12 mute, +24 play, +25 overdub
//! MODE       CLEAR - 2
//! ```

use serde::{Deserialize, Serialize};

use crate::error::PedalError;
use crate::pedal::TRACK_COUNT;

/// Track-scoped note offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackNote {
    Select,
    Undo,
    MuteToggle,
    ForcePlay,
    ForceOverdub,
}

impl TrackNote {
    pub const ALL: [TrackNote; 5] = [
        TrackNote::Select,
        TrackNote::Undo,
        TrackNote::MuteToggle,
        TrackNote::ForcePlay,
        TrackNote::ForceOverdub,
    ];

    pub fn offset(self) -> u8 {
        match self {
            TrackNote::Select => 0,
            TrackNote::Undo => 1,
            TrackNote::MuteToggle => 12,
            TrackNote::ForcePlay => 24,
            TrackNote::ForceOverdub => 25,
        }
    }

    fn label(self) -> &'static str {
        match self {
            TrackNote::Select => "select",
            TrackNote::Undo => "undo",
            TrackNote::MuteToggle => "mute",
            TrackNote::ForcePlay => "play",
            TrackNote::ForceOverdub => "overdub",
        }
    }
}

/// What an inbound note-on asks the pedal to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundAction {
    Clear,
    NextState,
    Stop,
    ChangeMode,
    /// Track number 1..=4
    SelectTrack(usize),
    /// Track number 1..=4
    ToggleMute(usize),
}

/// Base note table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NoteMap {
    #[serde(default = "default_clear_note")]
    pub clear: u8,
    #[serde(default = "default_transport_note")]
    pub transport: u8,
    #[serde(default = "default_stop_note")]
    pub stop: u8,
    #[serde(default = "default_track_notes")]
    pub tracks: [u8; TRACK_COUNT],
}

impl Default for NoteMap {
    fn default() -> Self {
        Self {
            clear: default_clear_note(),
            transport: default_transport_note(),
            stop: default_stop_note(),
            tracks: default_track_notes(),
        }
    }
}

impl NoteMap {
    /// Note that toggles between RecordSelect and PlayMute
    pub fn mode_change(&self) -> u8 {
        self.clear.saturating_sub(2)
    }

    /// Derived note for a track-scoped action
    ///
    /// # Panics
    ///
    /// Panics if `track` is not in 1..=4.
    pub fn track_note(&self, track: usize, kind: TrackNote) -> u8 {
        self.tracks[track - 1].saturating_add(kind.offset())
    }

    /// Every action bound to an inbound note, in dispatch order
    ///
    /// Rows are checked independently, so a note shared by two rows fires
    /// both. A validated map never has such overlaps.
    pub fn inbound_actions(&self, note: u8) -> Vec<InboundAction> {
        let mut actions = Vec::new();

        if note == self.clear {
            actions.push(InboundAction::Clear);
        }
        if note == self.transport {
            actions.push(InboundAction::NextState);
        }
        if note == self.stop {
            actions.push(InboundAction::Stop);
        }
        if note == self.mode_change() {
            actions.push(InboundAction::ChangeMode);
        }
        for track in 1..=TRACK_COUNT {
            if note == self.track_note(track, TrackNote::Select) {
                actions.push(InboundAction::SelectTrack(track));
            }
        }
        for track in 1..=TRACK_COUNT {
            if note == self.track_note(track, TrackNote::MuteToggle) {
                actions.push(InboundAction::ToggleMute(track));
            }
        }

        actions
    }

    /// Check that every derived note fits in 0-127 and that the notes
    /// matched on input are unambiguous
    pub fn validate(&self) -> Result<(), PedalError> {
        if self.clear < 2 {
            return Err(PedalError::NoteOutOfRange {
                name: "mode (clear - 2)".to_string(),
                value: 0,
            });
        }

        let mut named: Vec<(String, u16)> = vec![
            ("clear".to_string(), self.clear as u16),
            ("transport".to_string(), self.transport as u16),
            ("stop".to_string(), self.stop as u16),
            ("mode".to_string(), self.mode_change() as u16),
        ];
        for (index, base) in self.tracks.iter().enumerate() {
            for kind in TrackNote::ALL {
                named.push((
                    format!("track{}.{}", index + 1, kind.label()),
                    *base as u16 + kind.offset() as u16,
                ));
            }
        }

        for (name, value) in &named {
            if *value > 127 {
                return Err(PedalError::NoteOutOfRange {
                    name: name.clone(),
                    value: *value,
                });
            }
        }

        // Undo, play and overdub notes are only ever sent, never matched
        let matched: Vec<&(String, u16)> = named
            .iter()
            .filter(|(name, _)| {
                !name.ends_with(".undo") && !name.ends_with(".play") && !name.ends_with(".overdub")
            })
            .collect();

        for (i, (first, note)) in matched.iter().enumerate() {
            if let Some((second, _)) = matched[i + 1..].iter().find(|(_, other)| other == note) {
                return Err(PedalError::NoteCollision {
                    first: first.clone(),
                    second: second.clone(),
                    note: *note as u8,
                });
            }
        }

        Ok(())
    }
}

fn default_clear_note() -> u8 { 40 }
fn default_transport_note() -> u8 { 41 }
fn default_stop_note() -> u8 { 43 }
fn default_track_notes() -> [u8; TRACK_COUNT] { [53, 55, 57, 59] }

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_derived_notes() {
        let map = NoteMap::default();

        assert_eq!(map.mode_change(), 38);
        assert_eq!(map.track_note(1, TrackNote::Select), 53);
        assert_eq!(map.track_note(2, TrackNote::Undo), 56);
        assert_eq!(map.track_note(3, TrackNote::MuteToggle), 69);
        assert_eq!(map.track_note(4, TrackNote::ForcePlay), 83);
        assert_eq!(map.track_note(4, TrackNote::ForceOverdub), 84);
    }

    #[test]
    fn test_inbound_base_notes() {
        let map = NoteMap::default();

        assert_eq!(map.inbound_actions(40), vec![InboundAction::Clear]);
        assert_eq!(map.inbound_actions(41), vec![InboundAction::NextState]);
        assert_eq!(map.inbound_actions(43), vec![InboundAction::Stop]);
        assert_eq!(map.inbound_actions(38), vec![InboundAction::ChangeMode]);
        assert_eq!(map.inbound_actions(57), vec![InboundAction::SelectTrack(3)]);
        assert_eq!(map.inbound_actions(67), vec![InboundAction::ToggleMute(2)]);
    }

    #[test]
    fn test_send_only_notes_are_not_matched() {
        let map = NoteMap::default();

        // Undo, force play and force overdub on track 1
        assert!(map.inbound_actions(54).is_empty());
        assert!(map.inbound_actions(77).is_empty());
        assert!(map.inbound_actions(78).is_empty());
        assert!(map.inbound_actions(0).is_empty());
    }

    #[test]
    fn test_overlapping_rows_all_fire() {
        let map = NoteMap {
            clear: 40,
            transport: 41,
            stop: 43,
            tracks: [41, 55, 57, 59],
        };

        assert_eq!(
            map.inbound_actions(41),
            vec![InboundAction::NextState, InboundAction::SelectTrack(1)]
        );
        assert!(matches!(map.validate(), Err(PedalError::NoteCollision { note: 41, .. })));
    }

    #[test]
    fn test_validate_default() {
        assert!(NoteMap::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overflowing_offsets() {
        let map = NoteMap {
            tracks: [53, 55, 57, 110],
            ..NoteMap::default()
        };

        match map.validate() {
            Err(PedalError::NoteOutOfRange { name, value }) => {
                assert_eq!(name, "track4.play");
                assert_eq!(value, 134);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_low_clear() {
        let map = NoteMap {
            clear: 1,
            ..NoteMap::default()
        };

        assert!(matches!(map.validate(), Err(PedalError::NoteOutOfRange { .. })));
    }

    proptest! {
        #[test]
        fn prop_valid_map_matches_each_inbound_note_once(
            clear in 2u8..=127,
            transport in 0u8..=127,
            stop in 0u8..=127,
            tracks in proptest::array::uniform4(0u8..=102),
        ) {
            let map = NoteMap { clear, transport, stop, tracks };
            if map.validate().is_ok() {
                for note in 0u8..=127 {
                    prop_assert!(map.inbound_actions(note).len() <= 1);
                }
            }
        }
    }
}
