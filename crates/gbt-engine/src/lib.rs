//! Sound engine for gbtracker.
//!
//! Renders notes to 8-bit PCM the way the sound chip's square and noise
//! channels do (envelope, sweep, pseudo-random noise) and sequences the
//! rendered buffers against the song's tempo.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod clock;
mod envelope;
mod frame;
mod frequency;
mod mixer;
mod noise;
pub mod sequencer;
mod synth;

pub use clock::{step_interval_ms, TempoClock};
pub use envelope::VolumeEnvelope;
pub use frame::Frame;
pub use frequency::{hz_to_register, register_to_hz, FrequencySweep, SweepOutcome};
pub use mixer::{render_song, step_samples, OfflineMixer, SAMPLE_SCALE};
pub use noise::{NoiseTable, NOISE_SEED, NOISE_TABLE_LEN};
pub use sequencer::{PlaybackState, Sequencer, SequencerError, StepEvent, StepTrigger};
pub use synth::{SampleBuffer, SynthConfig, Synthesizer, BUFFER_LEN, MAX_AMPLITUDE, SAMPLE_RATE};
