//! Actor implementations

pub mod orchestrator;

pub use orchestrator::{OrchestratorActor, OrchestratorActorArgs};
