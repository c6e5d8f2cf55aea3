//! # Resource Locator
//!
//! Resolves a stored resource to the external reference carried by its events.
//! [`RedfishLocator`] composes paths from numeric ids, walking parent links through the
//! registry:
//!
//! ```text
//! System  sys-2 (id 2)                -> /redfish/v1/Systems/2
//! Processor cpu-1 (id 1, parent sys-2) -> /redfish/v1/Systems/2/Processors/1
//! ```
//!
//! Resolution fails when any link of the chain is missing, which happens legitimately when
//! a resource is removed concurrently.

use crate::model::Component;
use crate::registry::HandlerRegistry;

/// Compact description of a stored resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub component: Component,
    pub uuid: String,
    pub id: u64,
    pub parent_uuid: String,
    pub parent_type: Component,
    pub agent_id: String,
}

pub trait ResourceLocator: Send + Sync {
    fn locate(&self, registry: &HandlerRegistry, component: Component, uuid: &str)
        -> Option<String>;
}

#[derive(Debug, Clone)]
pub struct RedfishLocator {
    prefix: String,
}

impl Default for RedfishLocator {
    fn default() -> Self {
        Self::new("/redfish/v1")
    }
}

impl RedfishLocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim_end_matches('/').to_string(),
        }
    }

    /// Kinds addressed directly below the service root.
    pub fn is_root(component: Component) -> bool {
        matches!(
            component,
            Component::Manager
                | Component::Chassis
                | Component::System
                | Component::EthernetSwitch
                | Component::StorageService
                | Component::Fabric
        )
    }

    pub fn segment(component: Component) -> &'static str {
        match component {
            Component::None => "",
            Component::Manager => "Managers",
            Component::Chassis => "Chassis",
            Component::System => "Systems",
            Component::Processor => "Processors",
            Component::Memory => "Memory",
            Component::StorageSubsystem => "Storage",
            Component::Drive => "Drives",
            Component::EthernetSwitch => "EthernetSwitches",
            Component::EthernetSwitchPort => "Ports",
            Component::Vlan => "VLANs",
            Component::Acl => "ACLs",
            Component::AclRule => "Rules",
            Component::StaticMac => "StaticMACs",
            Component::StorageService => "Services",
            Component::StoragePool => "StoragePools",
            Component::Volume => "Volumes",
            Component::Fabric => "Fabrics",
            Component::Switch => "Switches",
            Component::Port => "Ports",
            Component::Zone => "Zones",
            Component::Endpoint => "Endpoints",
        }
    }
}

impl ResourceLocator for RedfishLocator {
    fn locate(
        &self,
        registry: &HandlerRegistry,
        component: Component,
        uuid: &str,
    ) -> Option<String> {
        let resource = registry.describe(component, uuid)?;
        let segment = Self::segment(component);
        if Self::is_root(component) {
            return Some(format!("{}/{}/{}", self.prefix, segment, resource.id));
        }
        if resource.parent_type == Component::None {
            return None;
        }
        let parent = self.locate(registry, resource.parent_type, &resource.parent_uuid)?;
        Some(format!("{}/{}/{}", parent, segment, resource.id))
    }
}
