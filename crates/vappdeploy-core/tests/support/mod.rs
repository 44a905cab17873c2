//! In-memory management server for integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use vappdeploy_api::{
    CloneRequest, DatastoreSummary, EntityKind, EntitySummary, InventoryRef, PowerState,
    TaskHandle, TaskInfo, TaskState, VmRuntime,
};
use vappdeploy_client::{ClientError, ManagementApi, TaskMonitor};
use vappdeploy_core::Timing;

/// Millisecond pacing; settle grace keeps clone timestamps of consecutive
/// iterations apart.
pub fn fast_timing() -> Timing {
    Timing {
        spawn_stagger: Duration::from_millis(1),
        settle_grace: Duration::from_millis(2),
        poll_interval: Duration::from_millis(1),
        final_grace: Duration::ZERO,
    }
}

/// Calls recorded by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Login,
    Search(EntityKind),
    Clone {
        name: String,
        host: InventoryRef,
        location: InventoryRef,
        target: InventoryRef,
    },
    PowerOnMulti {
        vms: usize,
    },
    PowerOff(InventoryRef),
    Destroy(InventoryRef),
}

#[derive(Default)]
struct State {
    next_id: u64,
    order: Vec<InventoryRef>,
    entities: HashMap<InventoryRef, EntitySummary>,
    host_folders: HashMap<InventoryRef, InventoryRef>,
    vm_folders: HashMap<InventoryRef, InventoryRef>,
    host_datastores: HashMap<InventoryRef, Vec<InventoryRef>>,
    datastores: HashMap<InventoryRef, bool>,
    pool_owners: HashMap<InventoryRef, InventoryRef>,
    vapp_vms: HashMap<InventoryRef, Vec<InventoryRef>>,
    vm_runtime: HashMap<InventoryRef, VmRuntime>,
    tasks: HashMap<String, VecDeque<TaskState>>,
    calls: Vec<Call>,
    reject_login: bool,
    fail_clones: bool,
    fail_power_off: bool,
    fail_destroy: bool,
    power_off_errors: usize,
    power_on_limit: Option<usize>,
}

impl State {
    fn insert(
        &mut self,
        kind: EntityKind,
        name: &str,
        parent: Option<&InventoryRef>,
    ) -> InventoryRef {
        self.next_id += 1;
        let reference = InventoryRef::new(kind, format!("{kind}-{}", self.next_id));
        self.entities.insert(
            reference.clone(),
            EntitySummary {
                reference: reference.clone(),
                name: name.to_string(),
                parent: parent.cloned(),
            },
        );
        self.order.push(reference.clone());
        reference
    }

    /// Compute resource, host and datastore, plus a root pool if `with_pool`
    fn add_host(
        &mut self,
        folder: &InventoryRef,
        name: &str,
        accessible: bool,
        with_pool: bool,
    ) -> InventoryRef {
        let compute = self.insert(EntityKind::ComputeResource, name, Some(folder));
        let host = self.insert(EntityKind::HostSystem, name, Some(&compute));
        if with_pool {
            let pool = self.insert(EntityKind::ResourcePool, "Resources", Some(&compute));
            self.pool_owners.insert(pool, compute);
        }

        let datastore = self.insert(
            EntityKind::Datastore,
            &format!("datastore-{name}"),
            Some(folder),
        );
        self.datastores.insert(datastore.clone(), accessible);
        self.host_datastores.insert(host.clone(), vec![datastore]);
        host
    }

    fn remove(&mut self, reference: &InventoryRef) {
        self.entities.remove(reference);
        self.order.retain(|r| r != reference);
    }

    fn task(&mut self, states: &[TaskState]) -> TaskHandle {
        self.next_id += 1;
        let id = format!("task-{}", self.next_id);
        self.tasks.insert(id.clone(), states.iter().copied().collect());
        TaskHandle::new(id)
    }

    fn add_vms(&mut self, vapp: &InventoryRef, vapp_name: &str, host: &InventoryRef, count: usize) {
        let vms: Vec<_> = (1..=count)
            .map(|i| {
                let vm = self.insert(
                    EntityKind::VirtualMachine,
                    &format!("{vapp_name}-vm{i}"),
                    Some(vapp),
                );
                self.vm_runtime.insert(
                    vm.clone(),
                    VmRuntime {
                        host: host.clone(),
                        power_state: PowerState::PoweredOff,
                    },
                );
                vm
            })
            .collect();
        self.vapp_vms.insert(vapp.clone(), vms);
    }
}

/// Fake vCenter holding a small inventory tree
#[derive(Default)]
pub struct FakeVcenter {
    state: Mutex<State>,
}

impl FakeVcenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_datacenter(&self, name: &str) -> InventoryRef {
        let mut state = self.state.lock().unwrap();
        let root = state.insert(EntityKind::Folder, "Datacenters", None);
        let datacenter = state.insert(EntityKind::Datacenter, name, Some(&root));
        let host_folder = state.insert(EntityKind::Folder, "host", Some(&datacenter));
        let vm_folder = state.insert(EntityKind::Folder, "vm", Some(&datacenter));
        state.host_folders.insert(datacenter.clone(), host_folder);
        state.vm_folders.insert(datacenter.clone(), vm_folder);
        datacenter
    }

    /// Standalone host with its compute resource, root pool and one datastore
    pub fn add_host(&self, datacenter: &InventoryRef, name: &str, accessible: bool) -> InventoryRef {
        let mut state = self.state.lock().unwrap();
        let host_folder = state.host_folders[datacenter].clone();
        state.add_host(&host_folder, name, accessible, true)
    }

    /// Host whose compute resource owns no resource pool
    pub fn add_host_without_pool(&self, datacenter: &InventoryRef, name: &str) -> InventoryRef {
        let mut state = self.state.lock().unwrap();
        let host_folder = state.host_folders[datacenter].clone();
        state.add_host(&host_folder, name, true, false)
    }

    /// Host under a folder that has no datacenter above it
    pub fn add_detached_host(&self, name: &str) -> InventoryRef {
        let mut state = self.state.lock().unwrap();
        let folder = state.insert(EntityKind::Folder, "orphans", None);
        state.add_host(&folder, name, true, true)
    }

    /// Source vApp with `vm_count` powered-off VMs on `host`
    pub fn add_vapp(&self, name: &str, host: &InventoryRef, vm_count: usize) -> InventoryRef {
        let mut state = self.state.lock().unwrap();
        let vapp = state.insert(EntityKind::VirtualApp, name, None);
        state.add_vms(&vapp, name, host, vm_count);
        vapp
    }

    pub fn reject_login(&self) {
        self.state.lock().unwrap().reject_login = true;
    }

    /// Every clone task ends in error
    pub fn fail_clones(&self) {
        self.state.lock().unwrap().fail_clones = true;
    }

    /// Power-off tasks end in error and leave the VM running
    pub fn fail_power_off(&self) {
        self.state.lock().unwrap().fail_power_off = true;
    }

    /// The next `count` power-off requests are rejected outright
    pub fn reject_power_off_requests(&self, count: usize) {
        self.state.lock().unwrap().power_off_errors = count;
    }

    /// Destroy tasks end in error and leave the vApp in place
    pub fn fail_destroy(&self) {
        self.state.lock().unwrap().fail_destroy = true;
    }

    /// Power-on tasks only start the first `limit` VMs and then fail
    pub fn power_on_limit(&self, limit: usize) {
        self.state.lock().unwrap().power_on_limit = Some(limit);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clone_names(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Clone { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn clone_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Clone { .. }))
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    /// vApps currently present in inventory
    pub fn vapp_count(&self) -> usize {
        let state = self.state.lock().unwrap();
        state
            .order
            .iter()
            .filter(|r| r.is(EntityKind::VirtualApp))
            .count()
    }

    fn lookup<T: Clone>(
        map: &HashMap<InventoryRef, T>,
        reference: &InventoryRef,
    ) -> Result<T, ClientError> {
        map.get(reference)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(reference.to_string()))
    }
}

#[async_trait]
impl TaskMonitor for FakeVcenter {
    async fn task_info(&self, task: &TaskHandle) -> Result<TaskInfo, ClientError> {
        let mut state = self.state.lock().unwrap();
        let script = state
            .tasks
            .get_mut(&task.id)
            .ok_or_else(|| ClientError::NotFound(task.id.clone()))?;
        let task_state = if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            *script.front().unwrap()
        };
        Ok(TaskInfo::new(task_state))
    }
}

#[async_trait]
impl ManagementApi for FakeVcenter {
    async fn login(&self) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Login);
        if state.reject_login {
            return Err(ClientError::Authentication("invalid credentials".to_string()));
        }
        Ok(())
    }

    async fn logout(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn search(&self, kind: EntityKind) -> Result<Vec<EntitySummary>, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Search(kind));
        Ok(state
            .order
            .iter()
            .filter(|r| r.is(kind))
            .map(|r| state.entities[r].clone())
            .collect())
    }

    async fn entity(&self, entity: &InventoryRef) -> Result<EntitySummary, ClientError> {
        let state = self.state.lock().unwrap();
        Self::lookup(&state.entities, entity)
    }

    async fn host_datastores(&self, host: &InventoryRef) -> Result<Vec<InventoryRef>, ClientError> {
        let state = self.state.lock().unwrap();
        Self::lookup(&state.host_datastores, host)
    }

    async fn datastore_summary(
        &self,
        datastore: &InventoryRef,
    ) -> Result<DatastoreSummary, ClientError> {
        let state = self.state.lock().unwrap();
        let accessible = Self::lookup(&state.datastores, datastore)?;
        Ok(DatastoreSummary {
            name: state.entities[datastore].name.clone(),
            accessible,
        })
    }

    async fn resource_pool_owner(&self, pool: &InventoryRef) -> Result<InventoryRef, ClientError> {
        let state = self.state.lock().unwrap();
        Self::lookup(&state.pool_owners, pool)
    }

    async fn datacenter_vm_folder(
        &self,
        datacenter: &InventoryRef,
    ) -> Result<InventoryRef, ClientError> {
        let state = self.state.lock().unwrap();
        Self::lookup(&state.vm_folders, datacenter)
    }

    async fn vapp_vms(&self, vapp: &InventoryRef) -> Result<Vec<InventoryRef>, ClientError> {
        let state = self.state.lock().unwrap();
        Self::lookup(&state.vapp_vms, vapp)
    }

    async fn vm_runtime(&self, vm: &InventoryRef) -> Result<VmRuntime, ClientError> {
        let state = self.state.lock().unwrap();
        Self::lookup(&state.vm_runtime, vm)
    }

    async fn clone_vapp(
        &self,
        source: &InventoryRef,
        request: &CloneRequest,
    ) -> Result<TaskHandle, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Clone {
            name: request.name.clone(),
            host: request.spec.host.clone(),
            location: request.spec.location.clone(),
            target: request.target.clone(),
        });

        if state.fail_clones {
            return Ok(state.task(&[TaskState::Running, TaskState::Failed]));
        }

        let vm_count = Self::lookup(&state.vapp_vms, source)?.len();
        let clone = state.insert(EntityKind::VirtualApp, &request.name, None);
        state.add_vms(&clone, &request.name, &request.spec.host, vm_count);

        Ok(state.task(&[TaskState::Running, TaskState::Succeeded]))
    }

    async fn power_on_multi(
        &self,
        _datacenter: &InventoryRef,
        vms: &[InventoryRef],
    ) -> Result<TaskHandle, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::PowerOnMulti { vms: vms.len() });

        let limit = state.power_on_limit.unwrap_or(vms.len()).min(vms.len());
        for vm in &vms[..limit] {
            if let Some(runtime) = state.vm_runtime.get_mut(vm) {
                runtime.power_state = PowerState::PoweredOn;
            }
        }

        let last = if limit == vms.len() {
            TaskState::Succeeded
        } else {
            TaskState::Failed
        };
        Ok(state.task(&[TaskState::Pending, TaskState::Running, last]))
    }

    async fn power_off_vm(&self, vm: &InventoryRef) -> Result<TaskHandle, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::PowerOff(vm.clone()));

        if state.power_off_errors > 0 {
            state.power_off_errors -= 1;
            return Err(ClientError::Api {
                status: 500,
                message: "power-off rejected".to_string(),
            });
        }
        if state.fail_power_off {
            return Ok(state.task(&[TaskState::Running, TaskState::Failed]));
        }

        let runtime = state
            .vm_runtime
            .get_mut(vm)
            .ok_or_else(|| ClientError::NotFound(vm.to_string()))?;
        runtime.power_state = PowerState::PoweredOff;

        Ok(state.task(&[TaskState::Succeeded]))
    }

    async fn destroy(&self, entity: &InventoryRef) -> Result<TaskHandle, ClientError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Destroy(entity.clone()));

        if state.fail_destroy {
            return Ok(state.task(&[TaskState::Running, TaskState::Failed]));
        }

        let vms = state.vapp_vms.remove(entity).unwrap_or_default();
        for vm in &vms {
            state.vm_runtime.remove(vm);
            state.remove(vm);
        }
        state.remove(entity);

        Ok(state.task(&[TaskState::Running, TaskState::Succeeded]))
    }
}
