//! Tempo clock: turns host ticks into step triggers.

use core::time::Duration;

/// Milliseconds of one step at `bpm`: `5000 / bpm`.
pub fn step_interval_ms(bpm: u16) -> f64 {
    5000.0 / bpm.max(1) as f64
}

/// Elapsed-time accumulator that fires at most one step per tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoClock {
    elapsed_ms: f64,
    interval_ms: f64,
}

impl TempoClock {
    pub fn new(bpm: u16) -> Self {
        Self { elapsed_ms: 0.0, interval_ms: step_interval_ms(bpm) }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Change the tempo; accumulated time is kept.
    pub fn set_bpm(&mut self, bpm: u16) {
        self.interval_ms = step_interval_ms(bpm);
    }

    /// Load a full interval so the next tick fires immediately.
    pub fn arm(&mut self) {
        self.elapsed_ms = self.interval_ms;
    }

    pub fn reset(&mut self) {
        self.elapsed_ms = 0.0;
    }

    /// Add `elapsed` and report whether a step is due.
    ///
    /// The remainder past the interval carries into the next step.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        self.elapsed_ms += elapsed.as_secs_f64() * 1000.0;
        if self.elapsed_ms >= self.interval_ms {
            self.elapsed_ms -= self.interval_ms;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_from_bpm() {
        assert!((step_interval_ms(120) - 41.666_666).abs() < 1e-5);
        assert_eq!(step_interval_ms(250), 20.0);
    }

    #[test]
    fn armed_clock_fires_on_first_tick() {
        let mut clock = TempoClock::new(120);
        clock.arm();
        assert!(clock.advance(Duration::ZERO));
        assert!(!clock.advance(Duration::from_millis(16)));
    }

    #[test]
    fn keeps_remainder_between_steps() {
        // 20 ms per step, ticked every 16 ms: steps land on ticks 2, 3, 4, 5 then 7.
        let mut clock = TempoClock::new(250);
        let fired: alloc::vec::Vec<bool> =
            (0..7).map(|_| clock.advance(Duration::from_millis(16))).collect();
        assert_eq!(fired, [false, true, true, true, true, false, true]);
    }

    #[test]
    fn at_most_one_step_per_tick() {
        let mut clock = TempoClock::new(250);
        assert!(clock.advance(Duration::from_millis(100)));
        // 80 ms still banked, drained one step per tick
        assert!(clock.advance(Duration::ZERO));
        assert!(clock.advance(Duration::ZERO));
        assert!(clock.advance(Duration::ZERO));
        assert!(clock.advance(Duration::ZERO));
        assert!(!clock.advance(Duration::ZERO));
    }
}
