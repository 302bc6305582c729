//! CPAL-based voice backend: one output stream per channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use gbt_engine::{SampleBuffer, SAMPLE_RATE};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use crate::config::AudioConfig;
use crate::traits::{AudioError, ChannelId, SinkFactory, VoiceSink};

/// How often the reclaimer drains its queue.
const RECLAIM_POLL: Duration = Duration::from_millis(5);

enum VoiceCommand {
    Start(SampleBuffer),
    Silence,
}

/// Opens [`CpalVoice`]s on the default output device.
#[derive(Clone, Debug, Default)]
pub struct CpalFactory {
    config: AudioConfig,
}

impl CpalFactory {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }
}

impl SinkFactory for CpalFactory {
    fn acquire(&self, channel: ChannelId) -> Result<Box<dyn VoiceSink>, AudioError> {
        Ok(Box::new(CpalVoice::open(channel, &self.config)?))
    }
}

/// A single output stream playing one note buffer at a time.
///
/// New buffers reach the stream callback through a command queue. Buffers the
/// callback is done with go back through a retire queue to a reclaimer thread,
/// which drops them after a grace delay so the callback never frees memory.
pub struct CpalVoice {
    channel: ChannelId,
    commands: HeapProd<VoiceCommand>,
    _stream: Stream,
    shutdown: Arc<AtomicBool>,
    reclaimer: Option<JoinHandle<()>>,
}

impl CpalVoice {
    /// Open a stream for `channel` on the default device.
    pub fn open(channel: ChannelId, config: &AudioConfig) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let stream_config: StreamConfig = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?
            .into();

        let depth = config.queue_depth.max(1);
        let (commands, command_rx) = HeapRb::<VoiceCommand>::new(depth).split();
        let (retire_tx, retire_rx) = HeapRb::<SampleBuffer>::new(depth * 2).split();

        let stream = build_stream(&device, &stream_config, channel, command_rx, retire_tx)?;
        stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let reclaimer = spawn_reclaimer(channel, retire_rx, shutdown.clone(), config.reclaim_grace)?;

        log::debug!(
            "opened {} voice at {} Hz, {} channels",
            channel,
            stream_config.sample_rate.0,
            stream_config.channels
        );

        Ok(Self {
            channel,
            commands,
            _stream: stream,
            shutdown,
            reclaimer: Some(reclaimer),
        })
    }

    pub fn channel(&self) -> ChannelId {
        self.channel
    }
}

impl VoiceSink for CpalVoice {
    fn start(&mut self, buffer: SampleBuffer) -> Result<(), AudioError> {
        self.commands
            .try_push(VoiceCommand::Start(buffer))
            .map_err(|_| AudioError::QueueFull)
    }

    fn silence(&mut self) -> Result<(), AudioError> {
        self.commands
            .try_push(VoiceCommand::Silence)
            .map_err(|_| AudioError::QueueFull)
    }
}

impl Drop for CpalVoice {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.reclaimer.take() {
            let _ = handle.join();
        }
    }
}

/// Playback position inside the callback.
struct CallbackState {
    current: Option<SampleBuffer>,
    /// Device frames since the current buffer started
    frames: u64,
    device_rate: u64,
    retire: HeapProd<SampleBuffer>,
}

impl CallbackState {
    fn retire_current(&mut self) {
        if let Some(buffer) = self.current.take() {
            // Dropped here only if the reclaimer has fallen far behind.
            let _ = self.retire.try_push(buffer);
        }
    }

    fn next_sample(&mut self) -> f32 {
        let Some(buffer) = &self.current else {
            return 0.0;
        };
        // Nearest source sample for this device frame
        let index = (self.frames * SAMPLE_RATE as u64 / self.device_rate) as usize;
        match buffer.get(index) {
            Some(&sample) => {
                self.frames += 1;
                sample as f32 / 128.0
            }
            None => {
                self.retire_current();
                0.0
            }
        }
    }
}

fn build_stream(
    device: &Device,
    config: &StreamConfig,
    channel: ChannelId,
    mut commands: HeapCons<VoiceCommand>,
    retire: HeapProd<SampleBuffer>,
) -> Result<Stream, AudioError> {
    let channels = config.channels.max(1) as usize;
    let mut state = CallbackState {
        current: None,
        frames: 0,
        device_rate: config.sample_rate.0.max(1) as u64,
        retire,
    };

    device
        .build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                while let Some(command) = commands.try_pop() {
                    state.retire_current();
                    if let VoiceCommand::Start(buffer) = command {
                        state.current = Some(buffer);
                        state.frames = 0;
                    }
                }

                // Same sample on every device channel
                for chunk in data.chunks_mut(channels) {
                    let sample = state.next_sample();
                    chunk.fill(sample);
                }
            },
            move |err| log::warn!("{} voice stream error: {}", channel, err),
            None,
        )
        .map_err(|e| AudioError::StreamCreate(e.to_string()))
}

/// Retired buffers waiting out the grace period, oldest first.
struct Reclaimer {
    grace: Duration,
    pending: VecDeque<(Instant, SampleBuffer)>,
    released: usize,
}

impl Reclaimer {
    fn new(grace: Duration) -> Self {
        Self { grace, pending: VecDeque::new(), released: 0 }
    }

    fn retire(&mut self, buffer: SampleBuffer, now: Instant) {
        self.pending.push_back((now, buffer));
    }

    /// Drop every buffer retired at least `grace` before `now`.
    fn release_due(&mut self, now: Instant) -> usize {
        let mut count = 0;
        while let Some((retired_at, _)) = self.pending.front() {
            if now.duration_since(*retired_at) < self.grace {
                break;
            }
            self.pending.pop_front();
            count += 1;
        }
        self.released += count;
        count
    }
}

fn spawn_reclaimer(
    channel: ChannelId,
    mut retired: HeapCons<SampleBuffer>,
    shutdown: Arc<AtomicBool>,
    grace: Duration,
) -> Result<JoinHandle<()>, AudioError> {
    std::thread::Builder::new()
        .name(format!("gbt-reclaim-{}", channel))
        .spawn(move || {
            let mut reclaimer = Reclaimer::new(grace);
            while !shutdown.load(Ordering::Relaxed) {
                let now = Instant::now();
                while let Some(buffer) = retired.try_pop() {
                    reclaimer.retire(buffer, now);
                }
                reclaimer.release_due(now);
                std::thread::sleep(RECLAIM_POLL);
            }
            log::debug!("{} reclaimer released {} buffers", channel, reclaimer.released);
        })
        .map_err(|e| AudioError::DeviceInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> SampleBuffer {
        SampleBuffer::from(vec![0i8; 4])
    }

    #[test]
    fn releases_every_buffer_past_grace_at_once() {
        let start = Instant::now();
        let mut reclaimer = Reclaimer::new(Duration::from_millis(20));
        for i in 0..100 {
            reclaimer.retire(buffer(), start + Duration::from_micros(i * 10));
        }
        assert_eq!(reclaimer.release_due(start + Duration::from_millis(10)), 0);
        assert_eq!(reclaimer.release_due(start + Duration::from_millis(21)), 100);
        assert_eq!(reclaimer.released, 100);
        assert!(reclaimer.pending.is_empty());
    }

    #[test]
    fn keeps_buffers_still_in_grace() {
        let start = Instant::now();
        let mut reclaimer = Reclaimer::new(Duration::from_millis(20));
        let held = buffer();
        reclaimer.retire(buffer(), start);
        reclaimer.retire(held.clone(), start + Duration::from_millis(15));
        assert_eq!(reclaimer.release_due(start + Duration::from_millis(25)), 1);
        assert_eq!(Arc::strong_count(&held), 2);
        assert_eq!(reclaimer.release_due(start + Duration::from_millis(35)), 1);
        assert_eq!(Arc::strong_count(&held), 1);
    }
}
