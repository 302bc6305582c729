//! Controller error type.

use gbt_audio::AudioError;
use gbt_engine::SequencerError;
use gbt_formats::FormatError;
use thiserror::Error;

/// Any failure surfaced through the controller.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Song(#[from] gbt_ir::Error),
    #[error(transparent)]
    Sequencer(#[from] SequencerError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
