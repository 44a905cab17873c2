//! vappdeploy-client: Management API client
//!
//! Provides the [`ManagementApi`] and [`TaskMonitor`] traits consumed by the
//! deployment core, and [`VsphereClient`], a session-based HTTPS
//! implementation of them.
//!
//! # Example
//!
//! ```no_run
//! use vappdeploy_api::EntityKind;
//! use vappdeploy_client::{ClientConfig, ManagementApi, VsphereClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("10.4.5.6", "administrator@vsphere.local", "secret");
//! let client = VsphereClient::new(config)?;
//! client.login().await?;
//!
//! for host in client.search(EntityKind::HostSystem).await? {
//!     println!("{}", host.name);
//! }
//!
//! client.logout().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod traits;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use http::VsphereClient;
pub use traits::{ManagementApi, TaskMonitor};
