//! `DeploymentWorker`: Per-host clone lifecycle
//!
//! Clones the source vApp onto one destination host, powers the copy on and
//! off again, and destroys it. One worker runs per destination host per
//! iteration; the clone it creates never leaves its call stack.

use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use vappdeploy_api::{
    CloneRequest, CloneSpec, DeployEvent, EntityKind, EntitySummary, InventoryRef, PowerState,
    TaskHandle,
};
use vappdeploy_client::{ClientError, ManagementApi};

use crate::config::Timing;
use crate::discovery::SourceAppliance;
use crate::error::WorkerError;
use crate::phase::WorkerPhase;
use crate::tracker::TaskTracker;

/// Name for a clone of `source` placed on `host` at `now`
///
/// Source name, millisecond timestamp and host name run together with no
/// separator; timestamp plus host keeps names unique across concurrent
/// workers and iterations.
#[must_use]
pub fn clone_name(source: &str, host: &str, now: DateTime<Local>) -> String {
    format!("{source}{}{host}", now.format("%Y%m%d-%H%M%S-%3f"))
}

/// Outcome of one worker invocation
#[derive(Debug, Clone)]
pub struct WorkerReport {
    /// Destination host name
    pub host: String,
    /// Name given to the clone, if the clone was issued
    pub clone_name: Option<String>,
    /// Clone task succeeded and the copy was found again by name
    pub cloned: bool,
    /// Aggregate power-on task succeeded
    pub powered_on: bool,
    /// Number of power-off tasks issued
    pub vms_powered_off: usize,
    /// All power-off tasks succeeded
    pub powered_off: bool,
    /// Destroy task succeeded
    pub destroyed: bool,
    /// Last phase entered
    pub phase: WorkerPhase,
}

impl WorkerReport {
    fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            clone_name: None,
            cloned: false,
            powered_on: false,
            vms_powered_off: 0,
            powered_off: false,
            destroyed: false,
            phase: WorkerPhase::Placing,
        }
    }

    /// Whether every step of the lifecycle succeeded
    #[must_use]
    pub fn success(&self) -> bool {
        self.cloned && self.powered_on && self.powered_off && self.destroyed
    }
}

/// Where the clone goes
#[derive(Debug, Clone)]
struct Placement {
    datastore: InventoryRef,
    resource_pool: InventoryRef,
    datacenter: InventoryRef,
    vm_folder: InventoryRef,
}

/// A clone created by this worker
#[derive(Debug)]
struct ClonedAppliance {
    name: String,
    reference: InventoryRef,
}

/// Runs the clone -> power on -> power off -> destroy sequence for one host
pub struct DeploymentWorker {
    api: Arc<dyn ManagementApi>,
    source: SourceAppliance,
    host: InventoryRef,
    iteration: u32,
    timing: Timing,
    event_tx: broadcast::Sender<DeployEvent>,
    host_name: String,
    phase: WorkerPhase,
}

impl DeploymentWorker {
    pub fn new(
        api: Arc<dyn ManagementApi>,
        source: SourceAppliance,
        host: InventoryRef,
        iteration: u32,
        timing: Timing,
        event_tx: broadcast::Sender<DeployEvent>,
    ) -> Self {
        let host_name = host.id.clone();
        Self {
            api,
            source,
            host,
            iteration,
            timing,
            event_tx,
            host_name,
            phase: WorkerPhase::Placing,
        }
    }

    /// Execute the whole lifecycle
    ///
    /// # Errors
    /// Returns an error if a placement object is missing, or if a management
    /// API call fails during placement, cloning or destroy. Task failures and
    /// power phase errors are not errors; they are recorded in the report.
    pub async fn run(mut self) -> Result<WorkerReport, WorkerError> {
        let mut report = WorkerReport::new(self.host.id.clone());
        let result = self.execute(&mut report).await;

        if let Err(e) = &result
            && self.phase.holds_clone()
        {
            warn!(
                host = %self.host_name,
                clone = report.clone_name.as_deref().unwrap_or_default(),
                phase = %self.phase,
                error = %e,
                "worker aborted while its clone exists, manual cleanup may be needed"
            );
        }

        result.map(|()| report)
    }

    async fn execute(&mut self, report: &mut WorkerReport) -> Result<(), WorkerError> {
        let host = self.api.entity(&self.host).await?;
        self.host_name = host.name.clone();
        report.host = host.name.clone();

        info!(host = %host.name, iteration = self.iteration, "vApp clone/deploy operation is about to start");

        let placement = self.resolve_placement(&host).await?;

        self.transition(WorkerPhase::Cloning, report);
        let name = clone_name(&self.source.name, &host.name, Local::now());
        report.clone_name = Some(name.clone());

        let Some(clone) = self.clone_appliance(name, &placement).await? else {
            return Ok(());
        };
        report.cloned = true;

        self.transition(WorkerPhase::PoweringOn, report);
        report.powered_on = self.power_on(&clone, &placement.datacenter).await;

        info!(host = %self.host_name, "begin cleanup tasks");
        tokio::time::sleep(self.timing.settle_grace).await;

        self.transition(WorkerPhase::PoweringOff, report);
        let (issued, all_off) = self.power_off(&clone).await;
        report.vms_powered_off = issued;
        report.powered_off = all_off;

        tokio::time::sleep(self.timing.settle_grace).await;

        self.transition(WorkerPhase::Destroying, report);
        report.destroyed = self.destroy(&clone).await?;

        self.transition(WorkerPhase::Completed, report);
        Ok(())
    }

    fn tracker(&self) -> TaskTracker<'_, dyn ManagementApi> {
        TaskTracker::new(&*self.api, self.timing.poll_interval)
    }

    fn transition(&mut self, to: WorkerPhase, report: &mut WorkerReport) {
        let from = self.phase;
        self.phase = to;
        report.phase = to;

        info!(host = %self.host_name, from = %from, to = %to, "phase transition");

        // No subscribers is fine
        let _ = self.event_tx.send(DeployEvent::PhaseChanged {
            host: self.host_name.clone(),
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    async fn resolve_placement(&self, host: &EntitySummary) -> Result<Placement, WorkerError> {
        let datastore = self.find_datastore(host).await?;
        let resource_pool = self.find_resource_pool(host).await?;
        let datacenter = self.find_datacenter(host).await?;
        let vm_folder = self.api.datacenter_vm_folder(&datacenter).await?;

        Ok(Placement {
            datastore,
            resource_pool,
            datacenter,
            vm_folder,
        })
    }

    /// First datastore of the host that reports itself accessible
    async fn find_datastore(&self, host: &EntitySummary) -> Result<InventoryRef, WorkerError> {
        for datastore in self.api.host_datastores(&host.reference).await? {
            if self.api.datastore_summary(&datastore).await?.accessible {
                return Ok(datastore);
            }
        }

        Err(WorkerError::NoAccessibleDatastore(host.name.clone()))
    }

    /// Resource pool whose owner carries the name of the host's compute resource
    async fn find_resource_pool(&self, host: &EntitySummary) -> Result<InventoryRef, WorkerError> {
        let Some(compute_resource) = &host.parent else {
            return Err(WorkerError::NoResourcePool(host.name.clone()));
        };
        let compute_name = self.api.entity(compute_resource).await?.name;

        for pool in self.api.search(EntityKind::ResourcePool).await? {
            let owner = self.api.resource_pool_owner(&pool.reference).await?;
            if self.api.entity(&owner).await?.name == compute_name {
                return Ok(pool.reference);
            }
        }

        Err(WorkerError::NoResourcePool(host.name.clone()))
    }

    /// Walk parents upward until a datacenter is reached
    async fn find_datacenter(&self, host: &EntitySummary) -> Result<InventoryRef, WorkerError> {
        let mut current = host.parent.clone();

        while let Some(reference) = current {
            if reference.is(EntityKind::Datacenter) {
                return Ok(reference);
            }
            current = self.api.entity(&reference).await?.parent;
        }

        Err(WorkerError::NoDatacenter(host.name.clone()))
    }

    /// Clone the source vApp and look the copy up again by name
    async fn clone_appliance(
        &self,
        name: String,
        placement: &Placement,
    ) -> Result<Option<ClonedAppliance>, WorkerError> {
        let request = CloneRequest {
            name,
            target: placement.resource_pool.clone(),
            spec: CloneSpec {
                host: self.host.clone(),
                location: placement.datastore.clone(),
                vm_folder: placement.vm_folder.clone(),
            },
        };

        let task = self.api.clone_vapp(&self.source.reference, &request).await?;
        info!(host = %self.host_name, vapp = %request.name, "monitoring vApp deployment task");

        if !self.tracker().wait(&task).await?.is_success() {
            error!(host = %self.host_name, vapp = %request.name, "vApp deployment task failed");
            return Ok(None);
        }

        let Some(found) = self
            .api
            .find_by_name(EntityKind::VirtualApp, &request.name)
            .await?
        else {
            error!(host = %self.host_name, vapp = %request.name, "could not find deployed vApp in inventory");
            return Ok(None);
        };

        info!(host = %self.host_name, vapp = %request.name, "vApp deployment succeeded");
        let _ = self.event_tx.send(DeployEvent::CloneCreated {
            host: self.host_name.clone(),
            name: request.name.clone(),
        });

        Ok(Some(ClonedAppliance {
            name: request.name,
            reference: found.reference,
        }))
    }

    /// Power on every VM of the clone as one datacenter task
    ///
    /// Failures are logged and reported as `false`; cleanup follows either way.
    async fn power_on(&self, clone: &ClonedAppliance, datacenter: &InventoryRef) -> bool {
        info!(host = %self.host_name, vapp = %clone.name, "powering on all VMs");

        let powered_on = match self.issue_power_on(clone, datacenter).await {
            Ok(powered_on) => powered_on,
            Err(e) => {
                error!(host = %self.host_name, vapp = %clone.name, error = %e, "power-on request failed");
                false
            }
        };

        if powered_on {
            info!(host = %self.host_name, vapp = %clone.name, "all VMs powered on");
        } else {
            error!(host = %self.host_name, vapp = %clone.name, "not all VMs could be powered on");
        }

        powered_on
    }

    async fn issue_power_on(
        &self,
        clone: &ClonedAppliance,
        datacenter: &InventoryRef,
    ) -> Result<bool, ClientError> {
        let vms = self.api.vapp_vms(&clone.reference).await?;
        let task = self.api.power_on_multi(datacenter, &vms).await?;
        Ok(self.tracker().wait(&task).await?.is_success())
    }

    /// Power off every VM that reports powered on
    ///
    /// All power-off tasks are issued before any is waited on. A VM that
    /// cannot be read or powered off is logged and skipped; the tasks already
    /// issued are still drained and destroy still follows. Returns the number
    /// of tasks issued and whether every VM was powered off.
    async fn power_off(&self, clone: &ClonedAppliance) -> (usize, bool) {
        info!(host = %self.host_name, vapp = %clone.name, "powering off all powered-on VMs");

        let vms = match self.api.vapp_vms(&clone.reference).await {
            Ok(vms) => vms,
            Err(e) => {
                error!(host = %self.host_name, vapp = %clone.name, error = %e, "could not list VMs of vApp");
                return (0, false);
            }
        };

        let mut tasks = Vec::new();
        let mut issue_failed = false;
        for vm in &vms {
            match self.issue_power_off(vm).await {
                Ok(Some(task)) => tasks.push(task),
                Ok(None) => {}
                Err(e) => {
                    error!(host = %self.host_name, vm = %vm, error = %e, "could not power off VM");
                    issue_failed = true;
                }
            }
        }

        let all_off = self.tracker().wait_all(&tasks).await.is_success() && !issue_failed;
        if all_off {
            info!(host = %self.host_name, vapp = %clone.name, vms = tasks.len(), "all VMs powered off");
        } else {
            error!(host = %self.host_name, vapp = %clone.name, "not all VMs could be powered off");
        }

        (tasks.len(), all_off)
    }

    /// Power-off task for `vm` if it reports powered on
    async fn issue_power_off(&self, vm: &InventoryRef) -> Result<Option<TaskHandle>, ClientError> {
        if self.api.vm_runtime(vm).await?.power_state != PowerState::PoweredOn {
            return Ok(None);
        }
        self.api.power_off_vm(vm).await.map(Some)
    }

    async fn destroy(&self, clone: &ClonedAppliance) -> Result<bool, WorkerError> {
        info!(host = %self.host_name, vapp = %clone.name, "destroying vApp");

        let task = self.api.destroy(&clone.reference).await?;
        let destroyed = self.tracker().wait(&task).await?.is_success();

        if destroyed {
            info!(host = %self.host_name, vapp = %clone.name, "vApp destroyed");
        } else {
            error!(host = %self.host_name, vapp = %clone.name, "vApp could not be destroyed");
        }

        Ok(destroyed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    #[test]
    fn test_clone_name_format() {
        let now = Local.with_ymd_and_hms(2026, 10, 18, 9, 5, 3).unwrap() + TimeDelta::milliseconds(42);
        assert_eq!(
            clone_name("Golden", "Host1", now),
            "Golden20261018-090503-042Host1"
        );
    }

    #[test]
    fn test_clone_names_differ_per_host() {
        let now = Local::now();
        assert_ne!(clone_name("Golden", "Host1", now), clone_name("Golden", "Host2", now));
    }

    #[test]
    fn test_report_success_requires_every_step() {
        let mut report = WorkerReport::new("esx01");
        assert!(!report.success());

        report.cloned = true;
        report.powered_on = true;
        report.powered_off = true;
        assert!(!report.success());

        report.destroyed = true;
        assert!(report.success());
    }
}
