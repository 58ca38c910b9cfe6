//! Currently sounding notes
//!
//! Follows note on/off pairs across the whole event stream. Display filters
//! never affect this state.

use std::collections::BTreeSet;
use std::fmt;
use tracing::trace;

use crate::midi::{Event, MidiMessage};

/// One sounding-note slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteKey {
    /// Channel (0-15)
    pub channel: u8,
    /// Note number (0-127)
    pub note: u8,
}

impl NoteKey {
    pub fn new(channel: u8, note: u8) -> Self {
        Self { channel, note }
    }
}

impl fmt::Display for NoteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ch{}:{}", u16::from(self.channel) + 1, self.note)
    }
}

/// Set of notes currently held down
///
/// Keys are ordered by channel then note, so iteration is stable. Presence is
/// all that is tracked: repeated note-ons for the same key collapse.
#[derive(Debug, Clone, Default)]
pub struct ActiveNotes {
    notes: BTreeSet<NoteKey>,
}

impl ActiveNotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update from one event; kinds other than note on/off are ignored
    pub fn apply(&mut self, event: &Event) {
        match event.message {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } if velocity > 0 => {
                if self.notes.insert(NoteKey::new(channel, note)) {
                    trace!("Note started: ch{} n{}", u16::from(channel) + 1, note);
                }
            }
            // Velocity 0 note-on is a note-off
            MidiMessage::NoteOn { channel, note, .. } | MidiMessage::NoteOff { channel, note, .. } => {
                if self.notes.remove(&NoteKey::new(channel, note)) {
                    trace!("Note stopped: ch{} n{}", u16::from(channel) + 1, note);
                }
            }
            _ => {}
        }
    }

    pub fn contains(&self, channel: u8, note: u8) -> bool {
        self.notes.contains(&NoteKey::new(channel, note))
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Sounding notes, channel ascending then note ascending
    pub fn iter(&self) -> impl Iterator<Item = NoteKey> + '_ {
        self.notes.iter().copied()
    }

    /// Owned copy of the current state for a renderer
    pub fn snapshot(&self) -> Vec<NoteKey> {
        self.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::RawMessage;

    fn event(data: &[u8]) -> Event {
        Event::decode(RawMessage::copy_from_slice(data))
    }

    #[test]
    fn test_note_on_then_off() {
        let mut notes = ActiveNotes::new();

        notes.apply(&event(&[0x92, 60, 64]));
        assert!(notes.contains(2, 60));

        notes.apply(&event(&[0x82, 60, 64]));
        assert!(!notes.contains(2, 60));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_velocity_zero_is_note_off() {
        let mut notes = ActiveNotes::new();

        notes.apply(&event(&[0x92, 60, 64]));
        notes.apply(&event(&[0x92, 60, 0]));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_velocity_zero_never_inserts() {
        let mut notes = ActiveNotes::new();
        notes.apply(&event(&[0x90, 60, 0]));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_note_off_velocity_ignored() {
        let mut notes = ActiveNotes::new();
        notes.apply(&event(&[0x90, 60, 64]));
        notes.apply(&event(&[0x80, 60, 127]));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_removing_absent_note_is_noop() {
        let mut notes = ActiveNotes::new();
        notes.apply(&event(&[0x90, 64, 64]));

        notes.apply(&event(&[0x80, 60, 0]));
        notes.apply(&event(&[0x81, 64, 0]));

        assert_eq!(notes.snapshot(), vec![NoteKey::new(0, 64)]);
    }

    #[test]
    fn test_duplicate_note_on_collapses() {
        let mut notes = ActiveNotes::new();
        notes.apply(&event(&[0x90, 60, 64]));
        notes.apply(&event(&[0x90, 60, 100]));
        assert_eq!(notes.len(), 1);

        // One release is enough
        notes.apply(&event(&[0x80, 60, 0]));
        assert!(notes.is_empty());
    }

    #[test]
    fn test_other_kinds_leave_state_alone() {
        let mut notes = ActiveNotes::new();
        notes.apply(&event(&[0x90, 60, 64]));

        for data in [
            &[0xB0u8, 123, 0][..],
            &[0xA0, 60, 0],
            &[0xE0, 0, 0],
            &[0xFF],
            &[0xF0, 0x7E, 0xF7],
            &[0x42],
        ] {
            notes.apply(&event(data));
        }

        assert_eq!(notes.snapshot(), vec![NoteKey::new(0, 60)]);
    }

    #[test]
    fn test_display_out_of_range_channel() {
        assert_eq!(NoteKey::new(0, 60).to_string(), "Ch1:60");
        assert_eq!(NoteKey::new(255, 1).to_string(), "Ch256:1");
    }

    #[test]
    fn test_snapshot_order() {
        let mut notes = ActiveNotes::new();
        for data in [[0x93, 40, 1], [0x90, 72, 1], [0x90, 48, 1], [0x91, 30, 1]] {
            notes.apply(&event(&data));
        }

        assert_eq!(
            notes.snapshot(),
            vec![
                NoteKey::new(0, 48),
                NoteKey::new(0, 72),
                NoteKey::new(1, 30),
                NoteKey::new(3, 40),
            ]
        );
    }
}
