//! Frequency conversion and the square channel's sweep unit.
//!
//! The sweep hardware works on the 11-bit frequency register
//! `n = 2048 - 131072 / hz`, not on Hz directly.

use gbt_ir::Sweep;

use crate::synth::SAMPLE_RATE;

/// Samples per sweep unit (1/128 s).
pub const SWEEP_UNIT_SAMPLES: u32 = SAMPLE_RATE / 128;

/// Highest value of the 11-bit frequency register.
pub const REGISTER_MAX: f64 = 2047.0;

/// Frequency register value for a tone in Hz.
pub fn hz_to_register(hz: f64) -> f64 {
    2048.0 - 131_072.0 / hz
}

/// Tone in Hz for a frequency register value.
pub fn register_to_hz(n: f64) -> f64 {
    131_072.0 / (2048.0 - n)
}

/// Result of clocking the sweep unit at one sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SweepOutcome {
    /// No sweep boundary at this sample
    Unchanged,
    /// Frequency moved to this many Hz
    Retuned(f64),
    /// Register left 0..=2047; the note goes silent
    OutOfRange,
}

/// Sweep unit configuration for one note.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrequencySweep {
    period: u32,
    divisor: f64,
    increasing: bool,
}

impl FrequencySweep {
    /// Build the sweep unit; it stays idle unless the channel has sweep hardware.
    pub fn new(sweep: Sweep, sweep_capable: bool) -> Self {
        let period = if sweep_capable { sweep.step as u32 * SWEEP_UNIT_SAMPLES } else { 0 };
        Self {
            period,
            divisor: libm::pow(2.0, sweep.rate as f64),
            increasing: sweep.increasing,
        }
    }

    pub fn is_active(&self) -> bool {
        self.period > 0
    }

    /// Apply the sweep at sample `index` to a tone currently at `hz`.
    pub fn clock(&self, index: usize, hz: f64) -> SweepOutcome {
        if self.period == 0 || index == 0 || index % self.period as usize != 0 {
            return SweepOutcome::Unchanged;
        }
        let n = hz_to_register(hz);
        let delta = n / self.divisor;
        let swept = if self.increasing { n + delta } else { n - delta };
        if !(0.0..=REGISTER_MAX).contains(&swept) {
            return SweepOutcome::OutOfRange;
        }
        SweepOutcome::Retuned(register_to_hz(swept))
    }
}
