//! File formats for gbtracker.
//!
//! The song text format used for save files, the register export table
//! consumed by source-code exporters, and WAV output for bounced audio.

mod error;
mod export;
mod song_text;
mod wav_format;

pub use error::FormatError;
pub use export::{export_rows, export_table, ExportRow};
pub use song_text::{parse_song, serialize_song};
pub use wav_format::{frames_to_wav, note_to_wav, write_note_wav, write_wav};
