//! Owner of every output channel for one application run.

use gbt_engine::{SampleBuffer, StepTrigger};
use gbt_ir::TrackRole;

use crate::channel::{ChannelStatus, PlaybackChannel};
use crate::traits::{AudioError, ChannelId, SinkFactory};

/// The three sequencer channels plus a preview channel for auditioning.
///
/// Dropping the registry releases every voice.
#[derive(Debug)]
pub struct ChannelRegistry {
    tracks: [PlaybackChannel; 3],
    preview: PlaybackChannel,
}

impl ChannelRegistry {
    /// Open all four channels. A channel that fails to open stays
    /// unavailable without affecting the others.
    pub fn open(factory: &dyn SinkFactory) -> Self {
        let tracks = ChannelId::TRACKS.map(|id| PlaybackChannel::open(id, factory));
        let preview = PlaybackChannel::open(ChannelId::Preview, factory);
        let ready = tracks.iter().filter(|c| c.is_available()).count();
        log::info!("opened {} of 3 track channels", ready);
        Self { tracks, preview }
    }

    pub fn channel(&self, role: TrackRole) -> &PlaybackChannel {
        &self.tracks[role.index()]
    }

    pub fn channel_mut(&mut self, role: TrackRole) -> &mut PlaybackChannel {
        &mut self.tracks[role.index()]
    }

    pub fn preview(&mut self) -> &mut PlaybackChannel {
        &mut self.preview
    }

    /// Status of the three track channels, in track order.
    pub fn status(&self) -> [ChannelStatus; 3] {
        [
            self.tracks[0].status(),
            self.tracks[1].status(),
            self.tracks[2].status(),
        ]
    }

    /// Start every triggered buffer on its channel; returns how many started.
    ///
    /// Channels are independent: an unavailable or busy channel only drops
    /// its own trigger.
    pub fn dispatch(&mut self, triggers: &[StepTrigger]) -> usize {
        let mut started = 0;
        for trigger in triggers {
            if self.tracks[trigger.role.index()].play(trigger.buffer.clone()).is_ok() {
                started += 1;
            }
        }
        started
    }

    /// Audition a rendered note on the preview channel.
    pub fn preview_buffer(&mut self, buffer: SampleBuffer) -> Result<(), AudioError> {
        self.preview.play(buffer)
    }

    /// Silence every available channel.
    pub fn silence_all(&mut self) {
        for channel in self.tracks.iter_mut().chain(core::iter::once(&mut self.preview)) {
            if channel.is_available() {
                if let Err(err) = channel.silence() {
                    log::warn!("failed to silence {} channel: {}", channel.id(), err);
                }
            }
        }
    }

    /// Retry every unavailable channel; returns how many are now ready.
    pub fn reacquire_unavailable(&mut self, factory: &dyn SinkFactory) -> usize {
        let mut recovered = 0;
        for channel in self.tracks.iter_mut().chain(core::iter::once(&mut self.preview)) {
            if !channel.is_available() && channel.reacquire(factory).is_ok() {
                log::info!("{} channel reacquired", channel.id());
                recovered += 1;
            }
        }
        recovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryFactory, SinkEvent};
    use std::sync::Arc;

    fn trigger(role: TrackRole) -> StepTrigger {
        StepTrigger { role, step: 0, buffer: Arc::from(vec![5i8; 8]) }
    }

    #[test]
    fn failed_channel_does_not_block_others() {
        let factory = MemoryFactory::new();
        factory.fail(ChannelId::Track(TrackRole::Square));
        let mut registry = ChannelRegistry::open(&factory);

        let status = registry.status();
        assert_eq!(status[0], ChannelStatus::Ready);
        assert!(matches!(status[1], ChannelStatus::Unavailable(_)));
        assert_eq!(status[2], ChannelStatus::Ready);

        let triggers = [
            trigger(TrackRole::SquareSweep),
            trigger(TrackRole::Square),
            trigger(TrackRole::Noise),
        ];
        assert_eq!(registry.dispatch(&triggers), 2);
        assert_eq!(factory.started(ChannelId::Track(TrackRole::SquareSweep)), 1);
        assert_eq!(factory.started(ChannelId::Track(TrackRole::Square)), 0);
        assert_eq!(factory.started(ChannelId::Track(TrackRole::Noise)), 1);

        factory.restore(ChannelId::Track(TrackRole::Square));
        assert_eq!(registry.reacquire_unavailable(&factory), 1);
        assert_eq!(registry.dispatch(&triggers[1..2]), 1);
    }

    #[test]
    fn preview_is_separate_from_tracks() {
        let factory = MemoryFactory::new();
        let mut registry = ChannelRegistry::open(&factory);
        registry.preview_buffer(Arc::from(vec![1i8; 4])).unwrap();
        assert_eq!(factory.events(), [SinkEvent::Start { channel: ChannelId::Preview, len: 4 }]);

        registry.silence_all();
        assert_eq!(factory.events().len(), 5);
        assert!(factory.sounding(ChannelId::Preview).is_none());
        assert_eq!(factory.replaced(ChannelId::Preview), 1);
    }
}
