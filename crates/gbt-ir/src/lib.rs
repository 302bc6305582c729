//! Core IR types for gbtracker.
//!
//! Defines the note, track and song values shared by the engine, the
//! file formats and the controller, plus the codec between notes and the
//! sound chip's packed registers.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod analysis;
mod error;
mod note;
pub mod registers;
mod song;
mod track;

pub use analysis::{analyze, SongFeatures};
pub use error::{Error, Register, Result};
pub use note::{
    CounterWidth, Cutoff, DutyCycle, Envelope, NoiseTone, Note, NoteKind, SquareTone, Sweep, Tone,
    MAX_OCTAVE, MIN_OCTAVE, NOTE_NAMES,
};
pub use registers::{decode_noise, decode_square, encode, Registers, BASE_FREQUENCY_TABLE};
pub use song::{Song, DEFAULT_BPM, STEPS_PER_BAR};
pub use track::{Track, TrackRole};
