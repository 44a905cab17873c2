//! Message types for actor communication
//!
//! Message handlers are implemented in `actor::orchestrator`.

use crate::config::DeployConfig;
use crate::worker::WorkerReport;

/// Open a session against the management endpoint
#[derive(Debug)]
pub struct ValidateSession;

/// Discover inventory and run every iteration
#[derive(Debug)]
pub struct RunDeployment {
    pub config: DeployConfig,
}

/// Result of one iteration
#[derive(Debug, Clone)]
pub struct IterationSummary {
    /// 1-based iteration number
    pub iteration: u32,
    /// Reports of workers that ran to the end
    pub reports: Vec<WorkerReport>,
    /// Hosts whose worker returned an error or panicked
    pub aborted_hosts: Vec<String>,
}

impl IterationSummary {
    /// Workers whose whole lifecycle succeeded
    #[must_use]
    pub fn completed(&self) -> usize {
        self.reports.iter().filter(|r| r.success()).count()
    }

    /// Workers that aborted or had a failed step
    #[must_use]
    pub fn failed(&self) -> usize {
        self.workers() - self.completed()
    }

    /// Workers spawned in this iteration
    #[must_use]
    pub fn workers(&self) -> usize {
        self.reports.len() + self.aborted_hosts.len()
    }
}

/// Result of a whole run
#[derive(Debug, Clone)]
pub struct DeploymentSummary {
    /// Source vApp name
    pub source: String,
    /// Destination host names, in spawn order
    pub destinations: Vec<String>,
    pub iterations: Vec<IterationSummary>,
}

impl DeploymentSummary {
    /// Workers spawned across all iterations
    #[must_use]
    pub fn total_workers(&self) -> usize {
        self.iterations.iter().map(IterationSummary::workers).sum()
    }

    #[must_use]
    pub fn completed(&self) -> usize {
        self.iterations.iter().map(IterationSummary::completed).sum()
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.iterations.iter().map(IterationSummary::failed).sum()
    }
}
