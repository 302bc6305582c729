//! Volume envelope stepping.

use gbt_ir::Envelope;

use crate::synth::SAMPLE_RATE;

/// Samples per envelope unit (1/64 s).
pub const ENVELOPE_UNIT_SAMPLES: u32 = SAMPLE_RATE / 64;

/// Runtime state of a note's volume envelope.
///
/// Volume moves by one level every `step * 750` samples, clamped to 0..=15.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VolumeEnvelope {
    volume: u8,
    period: u32,
    increasing: bool,
}

impl VolumeEnvelope {
    pub fn new(envelope: Envelope) -> Self {
        Self {
            volume: envelope.volume.min(15),
            period: envelope.step as u32 * ENVELOPE_UNIT_SAMPLES,
            increasing: envelope.increasing,
        }
    }

    /// Current volume (0-15).
    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Advance to sample `index`, ramping on every period boundary after 0.
    pub fn clock(&mut self, index: usize) {
        if self.period == 0 || index == 0 || index % self.period as usize != 0 {
            return;
        }
        if self.increasing {
            self.volume = (self.volume + 1).min(15);
        } else {
            self.volume = self.volume.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(envelope: Envelope, samples: usize) -> alloc::vec::Vec<u8> {
        let mut state = VolumeEnvelope::new(envelope);
        (0..samples)
            .map(|i| {
                state.clock(i);
                state.volume()
            })
            .collect()
    }

    #[test]
    fn constant_when_step_zero() {
        let volumes = run(Envelope { volume: 9, step: 0, increasing: true }, 10_000);
        assert!(volumes.iter().all(|&v| v == 9));
    }

    #[test]
    fn decays_one_level_per_period() {
        let volumes = run(Envelope { volume: 3, step: 1, increasing: false }, 4000);
        assert_eq!(volumes[749], 3);
        assert_eq!(volumes[750], 2);
        assert_eq!(volumes[1500], 1);
        assert_eq!(volumes[2250], 0);
        assert_eq!(volumes[3999], 0);
    }

    #[test]
    fn rises_and_clamps_at_fifteen() {
        let volumes = run(Envelope { volume: 14, step: 2, increasing: true }, 6000);
        assert_eq!(volumes[1499], 14);
        assert_eq!(volumes[1500], 15);
        assert_eq!(volumes[5999], 15);
    }
}
