//! Inventory entity types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Managed entity type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Datacenter,
    Folder,
    ComputeResource,
    HostSystem,
    ResourcePool,
    Datastore,
    VirtualApp,
    VirtualMachine,
}

impl EntityKind {
    /// Type name as used by the management API
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Datacenter => "Datacenter",
            Self::Folder => "Folder",
            Self::ComputeResource => "ComputeResource",
            Self::HostSystem => "HostSystem",
            Self::ResourcePool => "ResourcePool",
            Self::Datastore => "Datastore",
            Self::VirtualApp => "VirtualApp",
            Self::VirtualMachine => "VirtualMachine",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Opaque reference to a managed entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryRef {
    /// Entity type
    pub kind: EntityKind,
    /// Server-side identifier (e.g. `host-42`)
    pub id: String,
}

impl InventoryRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    #[must_use]
    pub fn is(&self, kind: EntityKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for InventoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Name and position of an entity in the inventory tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    /// Reference to the entity itself
    pub reference: InventoryRef,
    /// Display name
    pub name: String,
    /// Parent entity, `None` for the root folder
    #[serde(default)]
    pub parent: Option<InventoryRef>,
}

/// VM power state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerState {
    PoweredOn,
    PoweredOff,
    Suspended,
}

/// Runtime properties of a VM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmRuntime {
    /// Host the VM is registered on
    pub host: InventoryRef,
    /// Current power state
    pub power_state: PowerState,
}

/// Datastore summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatastoreSummary {
    pub name: String,
    /// Whether the datastore is currently reachable from its hosts
    pub accessible: bool,
}

/// Placement of a vApp clone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneSpec {
    /// Destination host
    pub host: InventoryRef,
    /// Datastore receiving the VM files
    pub location: InventoryRef,
    /// VM folder of the destination datacenter
    pub vm_folder: InventoryRef,
}

/// Body of a vApp clone request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloneRequest {
    /// Name of the new vApp
    pub name: String,
    /// Resource pool that will own the new vApp
    pub target: InventoryRef,
    pub spec: CloneSpec,
}

/// Body of a datacenter multi-VM power-on request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerOnMultiRequest {
    pub vms: Vec<InventoryRef>,
}
