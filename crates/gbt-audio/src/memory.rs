//! In-memory voices for running channels without an audio device.
//!
//! Every voice opened from one [`MemoryFactory`] records into the same
//! shared log, which tests and headless front ends inspect afterwards.

use std::sync::{Arc, Mutex, MutexGuard};

use gbt_engine::SampleBuffer;

use crate::traits::{AudioError, ChannelId, SinkFactory, VoiceSink};

/// Something a memory voice was asked to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkEvent {
    Start { channel: ChannelId, len: usize },
    Silence { channel: ChannelId },
}

const SLOTS: usize = 4;

fn slot(channel: ChannelId) -> usize {
    match channel {
        ChannelId::Track(role) => role.index(),
        ChannelId::Preview => 3,
    }
}

#[derive(Debug, Default)]
struct Shared {
    events: Vec<SinkEvent>,
    sounding: [Option<SampleBuffer>; SLOTS],
    replaced: [usize; SLOTS],
    failing: [bool; SLOTS],
}

/// Factory for [`MemorySink`]s sharing one event log.
#[derive(Clone, Debug, Default)]
pub struct MemoryFactory {
    shared: Arc<Mutex<Shared>>,
}

impl MemoryFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory whose log holds `events` entries before reallocating.
    pub fn with_capacity(events: usize) -> Self {
        let factory = Self::default();
        factory.lock().events.reserve(events);
        factory
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make later acquisitions of `channel` fail.
    pub fn fail(&self, channel: ChannelId) {
        self.lock().failing[slot(channel)] = true;
    }

    pub fn restore(&self, channel: ChannelId) {
        self.lock().failing[slot(channel)] = false;
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.lock().events.clone()
    }

    /// Number of buffers started on `channel`.
    pub fn started(&self, channel: ChannelId) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Start { channel: c, .. } if *c == channel))
            .count()
    }

    /// Number of buffers cut off by a later start or a silence.
    pub fn replaced(&self, channel: ChannelId) -> usize {
        self.lock().replaced[slot(channel)]
    }

    /// Buffer currently sounding on `channel`.
    pub fn sounding(&self, channel: ChannelId) -> Option<SampleBuffer> {
        self.lock().sounding[slot(channel)].clone()
    }

    pub fn clear(&self) {
        self.lock().events.clear();
    }
}

impl SinkFactory for MemoryFactory {
    fn acquire(&self, channel: ChannelId) -> Result<Box<dyn VoiceSink>, AudioError> {
        if self.lock().failing[slot(channel)] {
            return Err(AudioError::NoDevice);
        }
        Ok(Box::new(MemorySink { channel, shared: self.shared.clone() }))
    }
}

/// A voice that records instead of sounding.
#[derive(Debug)]
pub struct MemorySink {
    channel: ChannelId,
    shared: Arc<Mutex<Shared>>,
}

impl MemorySink {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl VoiceSink for MemorySink {
    fn start(&mut self, buffer: SampleBuffer) -> Result<(), AudioError> {
        let channel = self.channel;
        let mut shared = self.lock();
        shared.events.push(SinkEvent::Start { channel, len: buffer.len() });
        if shared.sounding[slot(channel)].replace(buffer).is_some() {
            shared.replaced[slot(channel)] += 1;
        }
        Ok(())
    }

    fn silence(&mut self) -> Result<(), AudioError> {
        let channel = self.channel;
        let mut shared = self.lock();
        shared.events.push(SinkEvent::Silence { channel });
        if shared.sounding[slot(channel)].take().is_some() {
            shared.replaced[slot(channel)] += 1;
        }
        Ok(())
    }
}
