//! vappdeploy
//!
//! Clones a source vApp onto every host of a vSphere inventory in parallel,
//! power-cycles the copies and destroys them, for a number of iterations.

use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use kameo::actor::Spawn;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use vappdeploy_client::{ClientConfig, ManagementApi, VsphereClient};
use vappdeploy_core::{
    DeployConfig, OrchestratorActor, OrchestratorActorArgs, RunDeployment, ValidateSession,
};

mod cli;
mod config;

use cli::Args;
use config::Config;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    println!("{}", cli::START_BANNER);
    let result = run(std::env::args().collect()).await;
    println!("{}", cli::FINISH_BANNER);

    result
}

async fn run(argv: Vec<String>) -> Result<()> {
    if !cli::has_minimum_args(argv.get(1..).unwrap_or_default()) {
        println!("{}", cli::usage());
        return Ok(());
    }

    let args = match Args::try_parse_from(&argv) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            println!("{}", cli::usage());
            return Ok(());
        }
    };

    // Load configuration
    let config_path = Config::locate(args.config.as_deref());
    let config = match &config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &config_path {
        Some(path) => info!(path = %path.display(), "loaded configuration"),
        None => debug!("no config file found, using defaults"),
    }

    for line in args.echo_lines() {
        println!("{line}");
    }

    let client_config = config.client.apply(ClientConfig::new(
        &args.vsphereip,
        &args.username,
        &args.password,
    ));
    let client = Arc::new(VsphereClient::new(client_config)?);

    let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let orchestrator = OrchestratorActor::spawn(OrchestratorActorArgs {
        api: client.clone(),
        event_tx,
    });

    info!(vsphere = %args.vsphereip, user = %args.username, "logging into vSphere with provided credentials");
    if let Err(e) = orchestrator.ask(ValidateSession).await {
        error!(vsphere = %args.vsphereip, error = %e, "could not log into vSphere");
        eprintln!("{}", cli::LOGIN_HINTS);
        println!("{}", cli::usage());
        orchestrator.stop_gracefully().await.ok();
        return Ok(());
    }

    let deploy = DeployConfig::new(args.srcvapp, args.iteration).with_timing(config.timing.into());
    match orchestrator.ask(RunDeployment { config: deploy }).await {
        Ok(summary) => {
            for iteration in &summary.iterations {
                info!(
                    iteration = iteration.iteration,
                    workers = iteration.workers(),
                    completed = iteration.completed(),
                    failed = iteration.failed(),
                    aborted = ?iteration.aborted_hosts,
                    "iteration summary"
                );
            }
            info!(
                source = %summary.source,
                workers = summary.total_workers(),
                completed = summary.completed(),
                failed = summary.failed(),
                "all iterations done"
            );
        }
        Err(e) => error!(error = %e, "deployment aborted"),
    }

    if let Err(e) = client.logout().await {
        warn!(error = %e, "failed to log out of vSphere");
    }

    orchestrator.stop_gracefully().await.ok();
    Ok(())
}
