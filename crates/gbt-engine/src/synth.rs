//! Note synthesizer: renders one note into a fixed-length 8-bit PCM buffer.
//!
//! Rendering happens ahead of playback (the sequencer's prepare pass), so the
//! per-sample loops here favour clarity over speed.

use alloc::sync::Arc;
use alloc::vec;

use gbt_ir::{Note, NoiseTone, SquareTone, Tone};

use crate::envelope::VolumeEnvelope;
use crate::frequency::{FrequencySweep, SweepOutcome};
use crate::noise::NoiseTable;

/// Output sample rate of every rendered buffer.
pub const SAMPLE_RATE: u32 = 48_000;

/// Capacity of a rendered note: three seconds.
pub const BUFFER_LEN: usize = 3 * SAMPLE_RATE as usize;

/// Largest 8-bit amplitude before the player volume is applied.
pub const MAX_AMPLITUDE: f32 = 127.0;

/// A rendered note, shared between the sequencer cache and audio voices.
pub type SampleBuffer = Arc<[i8]>;

/// Synthesizer settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SynthConfig {
    /// Fraction of full scale used at volume 15 (0.3..=0.5)
    pub player_volume: f32,
}

impl SynthConfig {
    pub const MIN_PLAYER_VOLUME: f32 = 0.3;
    pub const MAX_PLAYER_VOLUME: f32 = 0.5;

    /// Config with `player_volume` clamped into the supported range.
    pub fn with_player_volume(player_volume: f32) -> Self {
        let player_volume = if player_volume.is_finite() {
            player_volume.clamp(Self::MIN_PLAYER_VOLUME, Self::MAX_PLAYER_VOLUME)
        } else {
            Self::MAX_PLAYER_VOLUME
        };
        Self { player_volume }
    }
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self { player_volume: Self::MAX_PLAYER_VOLUME }
    }
}

/// Renders notes against a shared noise table.
#[derive(Clone, Debug)]
pub struct Synthesizer {
    noise: Arc<NoiseTable>,
    config: SynthConfig,
    /// Sample magnitude for each envelope volume
    amplitudes: [i8; 16],
}

impl Synthesizer {
    pub fn new(noise: Arc<NoiseTable>, config: SynthConfig) -> Self {
        let config = SynthConfig::with_player_volume(config.player_volume);
        let mut amplitudes = [0i8; 16];
        for (volume, amplitude) in amplitudes.iter_mut().enumerate() {
            let scaled = MAX_AMPLITUDE * config.player_volume * volume as f32 / 15.0;
            *amplitude = libm::roundf(scaled) as i8;
        }
        Self { noise, config, amplitudes }
    }

    pub fn config(&self) -> SynthConfig {
        self.config
    }

    pub fn noise_table(&self) -> &Arc<NoiseTable> {
        &self.noise
    }

    /// Magnitude of a sample at envelope `volume`.
    pub fn amplitude(&self, volume: u8) -> i8 {
        self.amplitudes[volume.min(15) as usize]
    }

    /// Render `note` into `buffer`, overwriting every sample.
    ///
    /// `sweep_capable` enables the frequency sweep unit; it is only set for
    /// the first square channel.
    pub fn render(&self, note: &Note, sweep_capable: bool, buffer: &mut [i8]) {
        let cutoff_sample = cutoff_sample(note);
        match note.tone() {
            Tone::Square(square) => {
                self.render_square(note, square, sweep_capable, cutoff_sample, buffer)
            }
            Tone::Noise(noise) => self.render_noise(note, noise, cutoff_sample, buffer),
        }
    }

    /// Render `note` into a freshly allocated buffer of [`BUFFER_LEN`] samples.
    pub fn render_note(&self, note: &Note, sweep_capable: bool) -> SampleBuffer {
        let mut samples = vec![0i8; BUFFER_LEN];
        self.render(note, sweep_capable, &mut samples);
        Arc::from(samples)
    }

    fn render_square(
        &self,
        note: &Note,
        square: &SquareTone,
        sweep_capable: bool,
        cutoff_sample: Option<u64>,
        buffer: &mut [i8],
    ) {
        let duty = square.duty.fraction();
        let sweep = FrequencySweep::new(square.sweep, sweep_capable);
        let mut envelope = VolumeEnvelope::new(note.envelope());
        let mut freq = square.frequency();
        let mut wavelength = SAMPLE_RATE as f64 / freq;
        let mut phase_adjust = 0.0;
        let mut pitch_out_of_range = false;

        for (i, sample) in buffer.iter_mut().enumerate() {
            if !pitch_out_of_range {
                match sweep.clock(i, freq) {
                    SweepOutcome::Unchanged => {}
                    SweepOutcome::Retuned(hz) => {
                        freq = hz;
                        wavelength = SAMPLE_RATE as f64 / freq;
                        phase_adjust = libm::fmod(i as f64, wavelength);
                    }
                    SweepOutcome::OutOfRange => pitch_out_of_range = true,
                }
            }
            envelope.clock(i);

            let silent = pitch_out_of_range || is_cut(i, cutoff_sample);
            let amplitude = if silent { 0 } else { self.amplitude(envelope.volume()) };
            let phase = libm::fmod(i as f64 - phase_adjust, wavelength);
            *sample = if phase / wavelength < duty { amplitude } else { -amplitude };
        }
    }

    fn render_noise(
        &self,
        note: &Note,
        noise: &NoiseTone,
        cutoff_sample: Option<u64>,
        buffer: &mut [i8],
    ) {
        let wrap = noise.counter_width.wrap();
        let wavelength = SAMPLE_RATE as f64 / noise.frequency();
        let mut envelope = VolumeEnvelope::new(note.envelope());
        let mut position = 0usize;
        let mut period = 0u64;
        let mut high = true;

        for (i, sample) in buffer.iter_mut().enumerate() {
            envelope.clock(i);

            // Advance once whenever a wavelength boundary is crossed.
            let current = libm::floor(i as f64 / wavelength) as u64;
            if i > 0 && current != period {
                period = current;
                high = self.noise.bit(position);
                position += 1;
                if position >= wrap {
                    position = 0;
                }
            }

            let amplitude =
                if is_cut(i, cutoff_sample) { 0 } else { self.amplitude(envelope.volume()) };
            *sample = if high { amplitude } else { -amplitude };
        }
    }
}

/// First silent sample index when the note has a cutoff.
///
/// A sample `i` is cut when `i / 48000 >= (64 - value) / 256`, evaluated in
/// integers as `i * 256 >= (64 - value) * 48000`.
fn cutoff_sample(note: &Note) -> Option<u64> {
    let cutoff = note.cutoff();
    if !cutoff.enabled {
        return None;
    }
    let ticks = 64 - cutoff.value.min(63) as u64;
    Some((ticks * SAMPLE_RATE as u64).div_ceil(256))
}

fn is_cut(index: usize, cutoff_sample: Option<u64>) -> bool {
    matches!(cutoff_sample, Some(first) if index as u64 >= first)
}
