//! Worker lifecycle phases

use std::fmt;

/// Step a `DeploymentWorker` is currently executing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    /// Resolving datastore, resource pool and datacenter
    Placing,
    Cloning,
    PoweringOn,
    PoweringOff,
    Destroying,
    Completed,
}

impl WorkerPhase {
    /// Whether a clone may exist on the server in this phase
    #[must_use]
    pub fn holds_clone(self) -> bool {
        matches!(self, Self::PoweringOn | Self::PoweringOff | Self::Destroying)
    }
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Placing => "placing",
            Self::Cloning => "cloning",
            Self::PoweringOn => "powering_on",
            Self::PoweringOff => "powering_off",
            Self::Destroying => "destroying",
            Self::Completed => "completed",
        };
        f.write_str(name)
    }
}
