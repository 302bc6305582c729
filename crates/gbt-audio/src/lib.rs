//! Audio output for gbtracker.
//!
//! Each logical channel owns one voice on the output device. A voice plays
//! one rendered note at a time; starting a new note replaces the old one and
//! the old buffer is released off the audio thread.

mod channel;
mod config;
mod cpal_backend;
pub mod memory;
mod registry;
mod traits;

pub use channel::{ChannelStatus, PlaybackChannel};
pub use config::AudioConfig;
pub use cpal_backend::{CpalFactory, CpalVoice};
pub use registry::ChannelRegistry;
pub use traits::{AudioError, ChannelId, SinkFactory, VoiceSink};
