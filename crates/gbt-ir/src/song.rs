//! Song structure: three tracks plus loop/end markers and tempo.

use crate::error::{Error, Result};
use crate::note::Note;
use crate::track::{Track, TrackRole};

/// Timeline resolution.
pub const STEPS_PER_BAR: u32 = 48;
/// Tempo of a new song.
pub const DEFAULT_BPM: u16 = 120;

/// A complete song.
///
/// Fields are private so the marker invariants (`loop_step < end_step`,
/// every note before `end_step`, `bpm > 0`) can only change through the
/// mutators below.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Song {
    tracks: [Track; 3],
    end_step: u32,
    loop_step: u32,
    looping: bool,
    bpm: u16,
}

impl Default for Song {
    fn default() -> Self {
        Self {
            tracks: Default::default(),
            end_step: STEPS_PER_BAR,
            loop_step: 0,
            looping: true,
            bpm: DEFAULT_BPM,
        }
    }
}

impl Song {
    /// Create a new empty one-bar song.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a song from loaded data, validating every invariant.
    pub fn from_parts(
        tracks: [Track; 3],
        end_step: u32,
        loop_step: u32,
        looping: bool,
        bpm: u16,
    ) -> Result<Self> {
        if bpm == 0 {
            return Err(Error::InvalidBpm);
        }
        if end_step == 0 {
            return Err(Error::OutOfRange { field: "end step", value: 0, min: 1, max: u32::MAX });
        }
        if loop_step >= end_step {
            return Err(Error::OutOfRange {
                field: "loop step",
                value: loop_step,
                min: 0,
                max: end_step - 1,
            });
        }
        for role in TrackRole::ALL {
            let track = &tracks[role.index()];
            for (step, note) in track.iter() {
                if note.kind() != role.note_kind() {
                    return Err(Error::KindMismatch { kind: note.kind(), role });
                }
                if step >= end_step {
                    return Err(Error::OutOfRange {
                        field: "note step",
                        value: step,
                        min: 0,
                        max: end_step - 1,
                    });
                }
            }
        }
        Ok(Self { tracks, end_step, loop_step, looping, bpm })
    }

    pub fn track(&self, role: TrackRole) -> &Track {
        &self.tracks[role.index()]
    }

    /// Tracks in role order.
    pub fn tracks(&self) -> &[Track; 3] {
        &self.tracks
    }

    pub fn note(&self, role: TrackRole, step: u32) -> Option<&Note> {
        self.tracks[role.index()].get(step)
    }

    /// Place a note, overwriting any note at that step.
    ///
    /// Extends `end_step` so the note is inside the song. The last `u32`
    /// step is rejected since no end marker can follow it.
    pub fn set_note(&mut self, role: TrackRole, step: u32, note: Note) -> Result<Option<Note>> {
        if note.kind() != role.note_kind() {
            return Err(Error::KindMismatch { kind: note.kind(), role });
        }
        let min_end = step.checked_add(1).ok_or(Error::OutOfRange {
            field: "step",
            value: step,
            min: 0,
            max: u32::MAX - 1,
        })?;
        let replaced = self.tracks[role.index()].insert(step, note);
        self.end_step = self.end_step.max(min_end);
        Ok(replaced)
    }

    pub fn clear_note(&mut self, role: TrackRole, step: u32) -> Option<Note> {
        self.tracks[role.index()].remove(step)
    }

    /// Remove every note, keeping markers and tempo.
    pub fn clear_all(&mut self) {
        for track in &mut self.tracks {
            track.clear();
        }
    }

    /// Highest step holding a note on any track (0 if none).
    pub fn max_occupied_step(&self) -> u32 {
        self.tracks
            .iter()
            .filter_map(Track::last_step)
            .max()
            .unwrap_or(0)
    }

    pub fn has_notes(&self) -> bool {
        self.tracks.iter().any(|t| !t.is_empty())
    }

    pub fn end_step(&self) -> u32 {
        self.end_step
    }

    /// Set the exclusive song length.
    ///
    /// Never cuts off placed notes; pulls `loop_step` back inside the song.
    /// Returns the effective value.
    pub fn set_end_step(&mut self, end_step: u32) -> u32 {
        let min_end = if self.has_notes() { self.max_occupied_step() + 1 } else { 1 };
        self.end_step = end_step.max(min_end);
        if self.loop_step >= self.end_step {
            self.loop_step = self.end_step - 1;
        }
        self.end_step
    }

    pub fn loop_step(&self) -> u32 {
        self.loop_step
    }

    /// Set the loop target, clamped inside the song. Returns the effective value.
    pub fn set_loop_step(&mut self, loop_step: u32) -> u32 {
        self.loop_step = loop_step.min(self.end_step - 1);
        self.loop_step
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    pub fn set_bpm(&mut self, bpm: u16) -> Result<()> {
        if bpm == 0 {
            return Err(Error::InvalidBpm);
        }
        self.bpm = bpm;
        Ok(())
    }

    /// Song length in whole bars, rounded up.
    pub fn bars(&self) -> u32 {
        self.end_step.div_ceil(STEPS_PER_BAR)
    }
}
