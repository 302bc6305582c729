//! Voice sink traits and error types.

use std::fmt;

use gbt_engine::SampleBuffer;
use gbt_ir::TrackRole;
use thiserror::Error;

/// Error type for audio operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("device init error: {0}")]
    DeviceInit(String),
    #[error("stream create error: {0}")]
    StreamCreate(String),
    #[error("playback error: {0}")]
    Playback(String),
    #[error("no audio device available")]
    NoDevice,
    /// The voice has not drained earlier commands yet
    #[error("voice command queue is full")]
    QueueFull,
    #[error("{0} channel has no audio resource")]
    ResourceUnavailable(ChannelId),
}

/// Identifies one output voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChannelId {
    Track(TrackRole),
    /// Auditions single notes outside the sequencer
    Preview,
}

impl ChannelId {
    /// The three sequencer channels, in track order.
    pub const TRACKS: [ChannelId; 3] = [
        ChannelId::Track(TrackRole::SquareSweep),
        ChannelId::Track(TrackRole::Square),
        ChannelId::Track(TrackRole::Noise),
    ];
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelId::Track(role) => write!(f, "{}", role),
            ChannelId::Preview => f.write_str("preview"),
        }
    }
}

/// One output voice. Plays at most one buffer at a time.
pub trait VoiceSink {
    /// Start `buffer` from its first sample, replacing whatever is sounding.
    ///
    /// Must not block on audio I/O.
    fn start(&mut self, buffer: SampleBuffer) -> Result<(), AudioError>;

    /// Stop the sounding buffer, if any.
    fn silence(&mut self) -> Result<(), AudioError>;
}

/// Opens voices on an output device.
pub trait SinkFactory {
    fn acquire(&self, channel: ChannelId) -> Result<Box<dyn VoiceSink>, AudioError>;
}
