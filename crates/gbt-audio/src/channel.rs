//! One logical output channel and its audio resource.

use std::fmt;

use gbt_engine::SampleBuffer;
use gbt_ir::TrackRole;

use crate::traits::{AudioError, ChannelId, SinkFactory, VoiceSink};

/// Whether a channel can currently make sound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelStatus {
    Ready,
    /// Acquisition failed; plays are ignored until reacquired
    Unavailable(String),
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelStatus::Ready => f.write_str("ready"),
            ChannelStatus::Unavailable(reason) => write!(f, "unavailable ({})", reason),
        }
    }
}

/// Plays rendered notes on one voice, one at a time.
pub struct PlaybackChannel {
    id: ChannelId,
    sink: Option<Box<dyn VoiceSink>>,
    failure: Option<String>,
}

impl PlaybackChannel {
    /// Acquire a voice for `id`. Failure leaves the channel unavailable
    /// rather than returning an error, so other channels can still open.
    pub fn open(id: ChannelId, factory: &dyn SinkFactory) -> Self {
        let mut channel = Self { id, sink: None, failure: None };
        if let Err(err) = channel.reacquire(factory) {
            log::warn!("{} channel unavailable: {}", id, err);
        }
        channel
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// True only for the first square channel, the one with sweep hardware.
    pub fn sweep_capable(&self) -> bool {
        matches!(self.id, ChannelId::Track(TrackRole::SquareSweep))
    }

    pub fn status(&self) -> ChannelStatus {
        match &self.failure {
            None => ChannelStatus::Ready,
            Some(reason) => ChannelStatus::Unavailable(reason.clone()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.sink.is_some()
    }

    /// Try to acquire the voice again, replacing any existing one.
    pub fn reacquire(&mut self, factory: &dyn SinkFactory) -> Result<(), AudioError> {
        self.sink = None;
        match factory.acquire(self.id) {
            Ok(sink) => {
                self.sink = Some(sink);
                self.failure = None;
                Ok(())
            }
            Err(err) => {
                self.failure = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Start `buffer`, cutting off the note that was sounding.
    pub fn play(&mut self, buffer: SampleBuffer) -> Result<(), AudioError> {
        match self.sink.as_mut() {
            Some(sink) => sink.start(buffer),
            None => Err(AudioError::ResourceUnavailable(self.id)),
        }
    }

    pub fn silence(&mut self) -> Result<(), AudioError> {
        match self.sink.as_mut() {
            Some(sink) => sink.silence(),
            None => Err(AudioError::ResourceUnavailable(self.id)),
        }
    }
}

impl fmt::Debug for PlaybackChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackChannel")
            .field("id", &self.id)
            .field("status", &self.status())
            .finish()
    }
}
