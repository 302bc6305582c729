//! Audio backend settings.

use std::time::Duration;

/// Settings shared by every voice a factory opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AudioConfig {
    /// Delay before a replaced buffer is released
    pub reclaim_grace: Duration,
    /// Capacity of each voice's command and retire queues
    pub queue_depth: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            reclaim_grace: Duration::from_millis(20),
            queue_depth: 8,
        }
    }
}
