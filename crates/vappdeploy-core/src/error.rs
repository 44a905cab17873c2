//! Core error types for vappdeploy-core

use thiserror::Error;
use vappdeploy_client::ClientError;

/// Errors that end a whole deployment run
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Session could not be opened
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// Source vApp not found in inventory
    #[error("could not find vApp {0} in inventory")]
    SourceNotFound(String),

    /// Source vApp exists but contains no VMs
    #[error("could not find any VMs in vApp {0}")]
    SourceHasNoVms(String),

    /// No destination host could be determined
    #[error("no hosts found in inventory")]
    NoHosts,

    /// Inventory query failed
    #[error("inventory query failed: {0}")]
    InventoryError(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl From<ClientError> for CoreError {
    fn from(e: ClientError) -> Self {
        Self::InventoryError(e.to_string())
    }
}

/// Errors that end a single worker
#[derive(Error, Debug)]
pub enum WorkerError {
    /// None of the host's datastores is accessible
    #[error("no accessible datastore on host {0}")]
    NoAccessibleDatastore(String),

    /// No resource pool is owned by the host's compute resource
    #[error("no resource pool found for host {0}")]
    NoResourcePool(String),

    /// Walking up from the host never reached a datacenter
    #[error("no datacenter found above host {0}")]
    NoDatacenter(String),

    /// Management API call failed
    #[error("management API error: {0}")]
    Client(#[from] ClientError),
}
