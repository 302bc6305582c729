//! Per-channel timelines.

use alloc::collections::BTreeMap;
use core::fmt;

use crate::note::{Note, NoteKind};

/// Fixed role of each of the three tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TrackRole {
    /// Square channel with frequency sweep (channel 1)
    SquareSweep,
    /// Plain square channel (channel 2)
    Square,
    /// Noise channel (channel 4)
    Noise,
}

impl TrackRole {
    /// All roles in track order.
    pub const ALL: [TrackRole; 3] = [TrackRole::SquareSweep, TrackRole::Square, TrackRole::Noise];

    pub const fn index(self) -> usize {
        match self {
            TrackRole::SquareSweep => 0,
            TrackRole::Square => 1,
            TrackRole::Noise => 2,
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(TrackRole::SquareSweep),
            1 => Some(TrackRole::Square),
            2 => Some(TrackRole::Noise),
            _ => None,
        }
    }

    /// Only the first square channel has sweep hardware.
    pub const fn has_sweep(self) -> bool {
        matches!(self, TrackRole::SquareSweep)
    }

    /// Kind of note this track accepts.
    pub const fn note_kind(self) -> NoteKind {
        match self {
            TrackRole::SquareSweep | TrackRole::Square => NoteKind::Square,
            TrackRole::Noise => NoteKind::Noise,
        }
    }
}

impl fmt::Display for TrackRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrackRole::SquareSweep => "square+sweep",
            TrackRole::Square => "square",
            TrackRole::Noise => "noise",
        })
    }
}

/// A mapping from step (48 per bar) to at most one note.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Track {
    notes: BTreeMap<u32, Note>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, step: u32) -> Option<&Note> {
        self.notes.get(&step)
    }

    /// Place a note, returning the one it replaced.
    pub fn insert(&mut self, step: u32, note: Note) -> Option<Note> {
        self.notes.insert(step, note)
    }

    pub fn remove(&mut self, step: u32) -> Option<Note> {
        self.notes.remove(&step)
    }

    /// Notes in ascending step order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Note)> + '_ {
        self.notes.iter().map(|(step, note)| (*step, note))
    }

    /// Highest occupied step.
    pub fn last_step(&self) -> Option<u32> {
        self.notes.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{Cutoff, Envelope, SquareTone};

    fn note(n: u8) -> Note {
        Note::square(SquareTone::new(n, 4), Envelope::default(), Cutoff::NONE).unwrap()
    }

    #[test]
    fn insert_overwrites_same_step() {
        let mut track = Track::new();
        assert_eq!(track.insert(12, note(0)), None);
        assert_eq!(track.insert(12, note(4)), Some(note(0)));
        assert_eq!(track.len(), 1);
        assert_eq!(track.get(12), Some(&note(4)));
    }

    #[test]
    fn iterates_in_step_order() {
        let mut track = Track::new();
        track.insert(30, note(1));
        track.insert(2, note(2));
        track.insert(17, note(3));
        let steps: alloc::vec::Vec<u32> = track.iter().map(|(s, _)| s).collect();
        assert_eq!(steps, [2, 17, 30]);
        assert_eq!(track.last_step(), Some(30));
    }

    #[test]
    fn role_indices() {
        for (i, role) in TrackRole::ALL.iter().enumerate() {
            assert_eq!(role.index(), i);
            assert_eq!(TrackRole::from_index(i), Some(*role));
        }
        assert_eq!(TrackRole::from_index(3), None);
        assert!(TrackRole::SquareSweep.has_sweep());
        assert!(!TrackRole::Square.has_sweep());
    }
}
