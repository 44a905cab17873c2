//! Management API traits

use async_trait::async_trait;
use vappdeploy_api::{
    CloneRequest, DatastoreSummary, EntityKind, EntitySummary, InventoryRef, TaskHandle, TaskInfo,
    VmRuntime,
};

use crate::error::Result;

/// Read access to server-side task state
#[async_trait]
pub trait TaskMonitor: Send + Sync {
    /// Fetch the current state of a task
    async fn task_info(&self, task: &TaskHandle) -> Result<TaskInfo>;
}

/// Inventory lookups and lifecycle operations against a management server
///
/// Every mutating call returns a [`TaskHandle`] immediately; completion is
/// observed through [`TaskMonitor::task_info`].
#[async_trait]
pub trait ManagementApi: TaskMonitor {
    /// Open a session with the configured credentials
    async fn login(&self) -> Result<()>;

    /// Close the current session
    async fn logout(&self) -> Result<()>;

    /// All entities of the given type
    async fn search(&self, kind: EntityKind) -> Result<Vec<EntitySummary>>;

    /// Name and parent of a single entity
    async fn entity(&self, entity: &InventoryRef) -> Result<EntitySummary>;

    /// Datastores mounted on a host
    async fn host_datastores(&self, host: &InventoryRef) -> Result<Vec<InventoryRef>>;

    async fn datastore_summary(&self, datastore: &InventoryRef) -> Result<DatastoreSummary>;

    /// Compute resource owning a resource pool
    async fn resource_pool_owner(&self, pool: &InventoryRef) -> Result<InventoryRef>;

    /// Root VM folder of a datacenter
    async fn datacenter_vm_folder(&self, datacenter: &InventoryRef) -> Result<InventoryRef>;

    /// VMs belonging to a vApp
    async fn vapp_vms(&self, vapp: &InventoryRef) -> Result<Vec<InventoryRef>>;

    async fn vm_runtime(&self, vm: &InventoryRef) -> Result<VmRuntime>;

    async fn clone_vapp(&self, source: &InventoryRef, request: &CloneRequest)
    -> Result<TaskHandle>;

    /// Power on a set of VMs as one datacenter-level task
    async fn power_on_multi(
        &self,
        datacenter: &InventoryRef,
        vms: &[InventoryRef],
    ) -> Result<TaskHandle>;

    async fn power_off_vm(&self, vm: &InventoryRef) -> Result<TaskHandle>;

    async fn destroy(&self, entity: &InventoryRef) -> Result<TaskHandle>;

    /// First entity of the given type with an exactly matching name
    async fn find_by_name(&self, kind: EntityKind, name: &str) -> Result<Option<EntitySummary>> {
        Ok(self
            .search(kind)
            .await?
            .into_iter()
            .find(|entity| entity.name == name))
    }
}
