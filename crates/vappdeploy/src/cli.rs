//! Command line arguments

use std::path::PathBuf;

use clap::Parser;

/// Fewer raw tokens than this cannot carry all five options with values
pub const MIN_ARG_TOKENS: usize = 10;

pub const START_BANNER: &str =
    "######################### Parallel vApp Deployer execution STARTED #########################";
pub const FINISH_BANNER: &str =
    "######################### Parallel vApp Deployer execution completed #########################";

pub const LOGIN_HINTS: &str = "Possible reasons:
1. Provided username/password credentials are incorrect
2. If username/password or other fields contain special characters, surround them with double quotes, or single quotes outside Windows
3. vCenter Server/ESXi server might not be reachable";

/// Parallel vApp clone, power-cycle and destroy harness
#[derive(Parser)]
#[command(name = "vappdeploy", version, about)]
pub struct Args {
    /// vCenter Server or ESXi address
    #[arg(long)]
    pub vsphereip: String,

    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub password: String,

    /// Name of the vApp to clone
    #[arg(long)]
    pub srcvapp: String,

    /// Number of clone/teardown rounds
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub iteration: u32,

    /// Optional TOML file with logging, timing and client settings
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Args {
    /// Argument echo printed at startup, password masked
    pub fn echo_lines(&self) -> Vec<String> {
        vec![
            "Reading vSphere IP and credentials from command line arguments".to_string(),
            "-------------------------------------------------------------------".to_string(),
            format!("vSphere IP: {}", self.vsphereip),
            format!("VC username: {}", self.username),
            "VC password: ******".to_string(),
            format!("Source vApp name: {}", self.srcvapp),
            format!("Iterations: {}", self.iteration),
            "-------------------------------------------------------------------".to_string(),
        ]
    }
}

/// Whether enough tokens were passed to attempt a run (program name excluded)
pub fn has_minimum_args(args: &[String]) -> bool {
    args.len() >= MIN_ARG_TOKENS
}

pub fn usage() -> String {
    [
        "Usage: vappdeploy --vsphereip <VC IP> --username <uname> --password <pwd> --srcvapp <SourcevAppName> --iteration <no of loops>",
        "\"vappdeploy --vsphereip 10.4.5.6 --username admin --password dummyPwd --srcvapp MyvApp --iteration 5\"",
    ]
    .join("\n")
}
