//! Player settings.

use std::time::Duration;

use gbt_audio::AudioConfig;
use gbt_engine::SynthConfig;

/// Everything the controller needs to build its engine and channels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerConfig {
    pub synth: SynthConfig,
    pub audio: AudioConfig,
    /// Rate at which the host calls `Controller::tick`
    pub tick_hz: u32,
}

impl PlayerConfig {
    /// Time between host ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.tick_hz.max(1)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            synth: SynthConfig::default(),
            audio: AudioConfig::default(),
            tick_hz: 60,
        }
    }
}
