//! Song feature analysis: scans a Song to report which features it uses.

use core::fmt;

use crate::note::Tone;
use crate::song::Song;
use crate::track::TrackRole;

/// Summary of features used in a song.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SongFeatures {
    pub notes_per_track: [usize; 3],
    /// Lowest and highest `(octave, semitone)` across square notes
    pub pitch_range: Option<((u8, u8), (u8, u8))>,
    pub sweep_notes: usize,
    pub envelope_notes: usize,
    pub cutoff_notes: usize,
    pub short_noise_notes: usize,
}

impl SongFeatures {
    pub fn total_notes(&self) -> usize {
        self.notes_per_track.iter().sum()
    }
}

/// Analyze a song and return a summary of which features it uses.
pub fn analyze(song: &Song) -> SongFeatures {
    let mut features = SongFeatures::default();

    for role in TrackRole::ALL {
        for (_, note) in song.track(role).iter() {
            features.notes_per_track[role.index()] += 1;
            if note.envelope().step > 0 {
                features.envelope_notes += 1;
            }
            if note.cutoff().enabled {
                features.cutoff_notes += 1;
            }
            match note.tone() {
                Tone::Square(square) => {
                    if role.has_sweep() && square.sweep.step > 0 {
                        features.sweep_notes += 1;
                    }
                    let pitch = (square.octave, square.musical_note);
                    features.pitch_range = Some(match features.pitch_range {
                        None => (pitch, pitch),
                        Some((lo, hi)) => (lo.min(pitch), hi.max(pitch)),
                    });
                }
                Tone::Noise(noise) => {
                    if noise.counter_width == crate::note::CounterWidth::Bits7 {
                        features.short_noise_notes += 1;
                    }
                }
            }
        }
    }

    features
}

impl fmt::Display for SongFeatures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Notes:    {} (sq1 {}, sq2 {}, noise {})",
            self.total_notes(),
            self.notes_per_track[0],
            self.notes_per_track[1],
            self.notes_per_track[2]
        )?;
        if let Some(((lo_oct, lo_note), (hi_oct, hi_note))) = self.pitch_range {
            writeln!(
                f,
                "Range:    {}{} - {}{}",
                crate::note::NOTE_NAMES[lo_note as usize],
                lo_oct,
                crate::note::NOTE_NAMES[hi_note as usize],
                hi_oct
            )?;
        }
        writeln!(f, "Sweep:    {}", self.sweep_notes)?;
        writeln!(f, "Envelope: {}", self.envelope_notes)?;
        writeln!(f, "Cutoff:   {}", self.cutoff_notes)?;
        writeln!(f, "7-bit:    {}", self.short_noise_notes)
    }
}
