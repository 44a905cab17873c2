//! Configuration types for deployment runs

use std::time::Duration;

/// Fixed delays driving a run
///
/// The management API offers no completion notifications, so these sleeps
/// are the only pacing between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Delay between spawning consecutive workers of one iteration
    pub spawn_stagger: Duration,
    /// Pause after power-on and after power-off
    pub settle_grace: Duration,
    /// Interval between task state polls
    pub poll_interval: Duration,
    /// Pause after the last iteration
    pub final_grace: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            spawn_stagger: Duration::from_secs(1),
            settle_grace: Duration::from_secs(10),
            poll_interval: Duration::from_secs(2),
            final_grace: Duration::from_secs(3),
        }
    }
}

/// Parameters of one deployment run
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Exact name of the vApp to clone
    pub source_vapp: String,
    /// Number of clone/teardown rounds
    pub iterations: u32,
    pub timing: Timing,
}

impl DeployConfig {
    pub fn new(source_vapp: impl Into<String>, iterations: u32) -> Self {
        Self {
            source_vapp: source_vapp.into(),
            iterations,
            timing: Timing::default(),
        }
    }

    #[must_use]
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }
}
