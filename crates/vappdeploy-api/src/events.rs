//! Deployment lifecycle events

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DeployEvent {
    IterationStarted {
        iteration: u32,
        hosts: usize,
    },
    WorkerStarted {
        iteration: u32,
        host: String,
    },
    PhaseChanged {
        host: String,
        from: String,
        to: String,
    },
    CloneCreated {
        host: String,
        name: String,
    },
    WorkerFinished {
        iteration: u32,
        host: String,
        success: bool,
    },
    IterationFinished {
        iteration: u32,
        completed: usize,
        failed: usize,
    },
}
