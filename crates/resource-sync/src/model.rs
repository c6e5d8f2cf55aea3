//! # Resource Model
//!
//! Shared vocabulary of the engine: resource kinds ([`Component`]), collection kinds
//! ([`CollectionType`]), status/health, and the [`ResourceModel`] trait every mirrored
//! resource type implements.
//!
//! ## The Header
//!
//! Every resource value embeds a [`ResourceHeader`] (usually via `#[serde(flatten)]`).
//! The agent fills `uuid`, `status` and `collections`. The engine stamps `parent_uuid`,
//! `parent_type`, `agent_id` and `id` after each fetch, so two fetches of an unchanged
//! resource compare equal.
//!
//! ```rust
//! use resource_sync::model::{Component, ResourceHeader, ResourceModel};
//! use resource_sync::id_policy::NumberingZone;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! struct Fan {
//!     #[serde(flatten)]
//!     header: ResourceHeader,
//!     #[serde(default)]
//!     rpm: u32,
//! }
//!
//! impl ResourceModel for Fan {
//!     const COMPONENT: Component = Component::Chassis;
//!     const NUMBERING: NumberingZone = NumberingZone::ParentSpace;
//!     fn header(&self) -> &ResourceHeader { &self.header }
//!     fn header_mut(&mut self) -> &mut ResourceHeader { &mut self.header }
//! }
//! ```

use crate::agent::FetchRequest;
use crate::id_policy::NumberingZone;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource kind tag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum Component {
    #[default]
    None,
    Manager,
    Chassis,
    System,
    Processor,
    Memory,
    StorageSubsystem,
    Drive,
    EthernetSwitch,
    EthernetSwitchPort,
    Vlan,
    Acl,
    AclRule,
    StaticMac,
    StorageService,
    StoragePool,
    Volume,
    Fabric,
    Switch,
    Port,
    Zone,
    Endpoint,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Component::None => "None",
            Component::Manager => "Manager",
            Component::Chassis => "Chassis",
            Component::System => "System",
            Component::Processor => "Processor",
            Component::Memory => "Memory",
            Component::StorageSubsystem => "StorageSubsystem",
            Component::Drive => "Drive",
            Component::EthernetSwitch => "EthernetSwitch",
            Component::EthernetSwitchPort => "EthernetSwitchPort",
            Component::Vlan => "Vlan",
            Component::Acl => "Acl",
            Component::AclRule => "AclRule",
            Component::StaticMac => "StaticMac",
            Component::StorageService => "StorageService",
            Component::StoragePool => "StoragePool",
            Component::Volume => "Volume",
            Component::Fabric => "Fabric",
            Component::Switch => "Switch",
            Component::Port => "Port",
            Component::Zone => "Zone",
            Component::Endpoint => "Endpoint",
        }
    }

    /// Agent command reading one resource of this kind, e.g. `getSystemInfo`.
    pub fn fetch_command(&self) -> String {
        format!("get{}Info", self.as_str())
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collection kind tag, as declared by a parent's fetched representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CollectionType {
    Managers,
    Chassis,
    Systems,
    Processors,
    Memory,
    StorageSubsystems,
    Drives,
    EthernetSwitches,
    EthernetSwitchPorts,
    Vlans,
    Acls,
    Rules,
    StaticMacs,
    StorageServices,
    StoragePools,
    Volumes,
    Fabrics,
    Switches,
    Ports,
    Zones,
    Endpoints,
}

impl fmt::Display for CollectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A named child collection declared by a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub name: String,
    #[serde(rename = "type")]
    pub collection_type: CollectionType,
    #[serde(default)]
    pub slot_mask: String,
}

impl Collection {
    pub fn new(name: impl Into<String>, collection_type: CollectionType) -> Self {
        Self {
            name: name.into(),
            collection_type,
            slot_mask: String::new(),
        }
    }
}

/// Health severity. The declaration order is the severity order used by rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Health {
    #[serde(rename = "OK")]
    Ok,
    Warning,
    Critical,
}

impl Health {
    /// The level that raises an `Alert` event.
    pub const WORST: Health = Health::Critical;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum State {
    Enabled,
    Disabled,
    Absent,
    Starting,
    InTest,
    StandbyOffline,
    UnavailableOffline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub state: Option<State>,
    #[serde(default)]
    pub health: Option<Health>,
}

impl Status {
    pub fn new(state: State, health: Health) -> Self {
        Self {
            state: Some(state),
            health: Some(health),
        }
    }
}

/// Fields common to every mirrored resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceHeader {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub parent_uuid: String,
    #[serde(default)]
    pub parent_type: Component,
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub collections: Vec<Collection>,
}

/// A resource type mirrored by a [`GenericHandler`](crate::handler::GenericHandler).
///
/// # Architecture Note
/// This trait is the kind-specific half of the engine. Everything else (fetching, diffing,
/// sweeping, cascading) lives once in the generic handler and is driven through these
/// constants and accessors.
pub trait ResourceModel:
    Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Kind tag of this resource type.
    const COMPONENT: Component;
    /// Numbering zone used when assigning REST ids.
    const NUMBERING: NumberingZone;

    fn header(&self) -> &ResourceHeader;
    fn header_mut(&mut self) -> &mut ResourceHeader;

    /// Request sent to the agent to read one resource of this kind.
    fn fetch_request(uuid: &str) -> FetchRequest {
        FetchRequest::new(Self::COMPONENT.fetch_command(), uuid)
    }
}
