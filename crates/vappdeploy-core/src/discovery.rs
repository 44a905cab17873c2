//! One-time inventory discovery before the first iteration

use tracing::{error, info};

use vappdeploy_api::{EntityKind, EntitySummary, InventoryRef};
use vappdeploy_client::ManagementApi;

use crate::error::CoreError;

/// The vApp every worker clones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAppliance {
    pub name: String,
    pub reference: InventoryRef,
}

/// Everything resolved once per run
#[derive(Debug, Clone)]
pub struct Discovery {
    pub source: SourceAppliance,
    /// Host currently running the source vApp
    pub source_host: EntitySummary,
    /// Hosts receiving a clone every iteration
    pub destinations: Vec<EntitySummary>,
}

/// Pick destination hosts
///
/// Every host except the source host, or the source host alone when the
/// inventory holds a single host.
#[must_use]
pub fn select_destinations(
    hosts: Vec<EntitySummary>,
    source_host: &EntitySummary,
) -> Vec<EntitySummary> {
    if hosts.len() > 1 {
        info!("found more than one host in inventory, forming target host list");
        hosts
            .into_iter()
            .filter(|host| host.name != source_host.name)
            .collect()
    } else {
        info!("only one host in inventory, using it as target host");
        vec![source_host.clone()]
    }
}

/// Resolve the source vApp, its host and the destination hosts
///
/// # Errors
/// Returns an error if the vApp does not exist, has no VMs, or an inventory
/// query fails.
pub async fn discover(api: &dyn ManagementApi, source_name: &str) -> Result<Discovery, CoreError> {
    info!(vapp = %source_name, "searching for vApp in inventory");

    let Some(source) = api.find_by_name(EntityKind::VirtualApp, source_name).await? else {
        error!(vapp = %source_name, "could not find vApp in inventory");
        return Err(CoreError::SourceNotFound(source_name.to_string()));
    };
    info!(vapp = %source_name, id = %source.reference.id, "found vApp in inventory");

    let vms = api.vapp_vms(&source.reference).await?;
    let Some(first_vm) = vms.first() else {
        error!(vapp = %source_name, "could not find any VMs in vApp");
        return Err(CoreError::SourceHasNoVms(source_name.to_string()));
    };

    let runtime = api.vm_runtime(first_vm).await?;
    let source_host = api.entity(&runtime.host).await?;
    info!(host = %source_host.name, "found source host");

    info!("retrieving host list from inventory");
    let hosts = api.search(EntityKind::HostSystem).await?;
    let destinations = select_destinations(hosts, &source_host);
    if destinations.is_empty() {
        return Err(CoreError::NoHosts);
    }

    Ok(Discovery {
        source: SourceAppliance {
            name: source.name,
            reference: source.reference,
        },
        source_host,
        destinations,
    })
}
