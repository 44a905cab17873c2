//! `OrchestratorActor`: Run-wide orchestration
//!
//! Owns the management session, discovers the source vApp and destination
//! hosts once, then runs one `DeploymentWorker` per destination host per
//! iteration with a barrier between iterations.

use std::sync::Arc;

use kameo::actor::{ActorRef, WeakActorRef};
use kameo::error::ActorStopReason;
use kameo::message::{Context, Message};
use kameo::prelude::*;
use tokio::sync::broadcast;
use tracing::{error, info};

use vappdeploy_api::DeployEvent;
use vappdeploy_client::ManagementApi;

use crate::config::Timing;
use crate::discovery::{Discovery, discover};
use crate::error::CoreError;
use crate::message::{DeploymentSummary, IterationSummary, RunDeployment, ValidateSession};
use crate::worker::DeploymentWorker;

/// Arguments for spawning an `OrchestratorActor`
pub struct OrchestratorActorArgs {
    /// Shared management session
    pub api: Arc<dyn ManagementApi>,
    /// Event broadcast sender
    pub event_tx: broadcast::Sender<DeployEvent>,
}

/// Orchestrator driving deployment iterations
pub struct OrchestratorActor {
    /// Shared management session
    api: Arc<dyn ManagementApi>,
    /// Event broadcast sender
    event_tx: broadcast::Sender<DeployEvent>,
}

impl OrchestratorActor {
    /// Spawn one worker per destination host and join them all
    async fn run_iteration(
        &self,
        iteration: u32,
        discovery: &Discovery,
        timing: Timing,
    ) -> IterationSummary {
        info!(
            iteration,
            hosts = discovery.destinations.len(),
            "***************  ITERATION - {iteration}  ***************"
        );
        let _ = self.event_tx.send(DeployEvent::IterationStarted {
            iteration,
            hosts: discovery.destinations.len(),
        });

        let mut handles = Vec::with_capacity(discovery.destinations.len());

        for host in &discovery.destinations {
            let worker = DeploymentWorker::new(
                self.api.clone(),
                discovery.source.clone(),
                host.reference.clone(),
                iteration,
                timing,
                self.event_tx.clone(),
            );

            let _ = self.event_tx.send(DeployEvent::WorkerStarted {
                iteration,
                host: host.name.clone(),
            });
            handles.push((host.name.clone(), tokio::spawn(worker.run())));

            // Throttle session calls against the management endpoint
            tokio::time::sleep(timing.spawn_stagger).await;
        }

        let mut summary = IterationSummary {
            iteration,
            reports: Vec::with_capacity(handles.len()),
            aborted_hosts: Vec::new(),
        };

        // Barrier: every worker finishes before the next iteration
        for (name, handle) in handles {
            let success = match handle.await {
                Ok(Ok(report)) => {
                    let success = report.success();
                    summary.reports.push(report);
                    success
                }
                Ok(Err(e)) => {
                    error!(host = %name, iteration, error = %e, "worker failed");
                    summary.aborted_hosts.push(name.clone());
                    false
                }
                Err(e) => {
                    error!(host = %name, iteration, error = %e, "worker panicked");
                    summary.aborted_hosts.push(name.clone());
                    false
                }
            };

            let _ = self.event_tx.send(DeployEvent::WorkerFinished {
                iteration,
                host: name,
                success,
            });
        }

        info!(
            iteration,
            completed = summary.completed(),
            failed = summary.failed(),
            "iteration finished"
        );
        let _ = self.event_tx.send(DeployEvent::IterationFinished {
            iteration,
            completed: summary.completed(),
            failed: summary.failed(),
        });

        summary
    }
}

impl Actor for OrchestratorActor {
    type Args = OrchestratorActorArgs;
    type Error = CoreError;

    async fn on_start(args: Self::Args, actor_ref: ActorRef<Self>) -> Result<Self, Self::Error> {
        info!(id = %actor_ref.id(), "OrchestratorActor starting");

        Ok(Self {
            api: args.api,
            event_tx: args.event_tx,
        })
    }

    async fn on_stop(
        &mut self,
        _actor_ref: WeakActorRef<Self>,
        reason: ActorStopReason,
    ) -> Result<(), Self::Error> {
        info!(reason = ?reason, "OrchestratorActor stopping");
        Ok(())
    }
}

// ============================================================================
// Message Handlers
// ============================================================================

impl Message<ValidateSession> for OrchestratorActor {
    type Reply = Result<(), CoreError>;

    async fn handle(
        &mut self,
        _msg: ValidateSession,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        match self.api.login().await {
            Ok(()) => {
                info!("successfully logged into vSphere");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "failed to log into vSphere");
                Err(CoreError::LoginFailed(e.to_string()))
            }
        }
    }
}

impl Message<RunDeployment> for OrchestratorActor {
    type Reply = Result<DeploymentSummary, CoreError>;

    async fn handle(
        &mut self,
        msg: RunDeployment,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        let config = msg.config;

        if config.iterations == 0 {
            return Err(CoreError::ConfigError(
                "iteration count must be at least 1".to_string(),
            ));
        }

        let discovery = discover(&*self.api, &config.source_vapp).await?;
        let destinations: Vec<String> = discovery
            .destinations
            .iter()
            .map(|host| host.name.clone())
            .collect();

        info!(
            source = %discovery.source.name,
            source_host = %discovery.source_host.name,
            destinations = ?destinations,
            iterations = config.iterations,
            "starting deployment"
        );

        let mut iterations = Vec::with_capacity(config.iterations as usize);
        for iteration in 1..=config.iterations {
            iterations.push(
                self.run_iteration(iteration, &discovery, config.timing)
                    .await,
            );
        }

        tokio::time::sleep(config.timing.final_grace).await;

        let summary = DeploymentSummary {
            source: discovery.source.name,
            destinations,
            iterations,
        };

        info!(
            workers = summary.total_workers(),
            completed = summary.completed(),
            failed = summary.failed(),
            "deployment finished"
        );

        Ok(summary)
    }
}
