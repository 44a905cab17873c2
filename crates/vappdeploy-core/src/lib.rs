//! vappdeploy-core: Deployment orchestration
//!
//! Implements the `OrchestratorActor` using the kameo framework, the
//! per-host `DeploymentWorker` that clones, power-cycles and destroys one
//! vApp copy, and the `TaskTracker` both use to wait on server-side tasks.

pub mod actor;
pub mod config;
pub mod discovery;
pub mod error;
pub mod message;
pub mod phase;
pub mod tracker;
pub mod worker;

pub use actor::orchestrator::{OrchestratorActor, OrchestratorActorArgs};
pub use config::{DeployConfig, Timing};
pub use discovery::{Discovery, SourceAppliance, discover, select_destinations};
pub use error::{CoreError, WorkerError};
pub use message::{DeploymentSummary, IterationSummary, RunDeployment, ValidateSession};
pub use phase::WorkerPhase;
pub use tracker::{TaskOutcome, TaskTracker};
pub use worker::{DeploymentWorker, WorkerReport, clone_name};
