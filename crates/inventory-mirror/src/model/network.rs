//! Ethernet switching kinds.

use super::mirrored;
use resource_sync::ResourceHeader;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EthernetSwitch {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub switch_id: String,
    pub manufacturer: String,
    pub firmware_version: String,
    pub role: String,
}

mirrored!(EthernetSwitch, Shared);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EthernetSwitchPort {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub port_id: String,
    pub link_type: String,
    pub operational_state: String,
    pub speed_mbps: u32,
    pub mac_address: String,
}

mirrored!(EthernetSwitchPort, ParentSpace);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Vlan {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub vlan_id: u16,
    pub tagged: bool,
}

mirrored!(Vlan, ParentSpace);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Acl {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub bound_ports: Vec<String>,
}

mirrored!(Acl, ParentSpace);

/// One rule of an [`Acl`]. Rule ids are scoped to their list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AclRule {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub rule_id: u32,
    pub action: String,
    pub source_ip: String,
    pub destination_ip: String,
}

mirrored!(AclRule, ParentSpace);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaticMac {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub address: String,
    pub vlan_id: u16,
}

mirrored!(StaticMac, ParentSpace);
