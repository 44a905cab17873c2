//! vappdeploy-api: Shared inventory and task types
//!
//! Contains the entity references, task handles and lifecycle events shared by
//! the management client, the deployment core and the CLI.

pub mod events;
pub mod inventory;
pub mod task;

pub use events::DeployEvent;
pub use inventory::{
    CloneRequest, CloneSpec, DatastoreSummary, EntityKind, EntitySummary, InventoryRef,
    PowerOnMultiRequest, PowerState, VmRuntime,
};
pub use task::{TaskHandle, TaskInfo, TaskState};
