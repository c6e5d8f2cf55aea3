//! Fabric kinds. A [`Zone`] groups [`Endpoint`]s of its fabric; that grouping is a weak
//! association and does not own the endpoints.

use super::mirrored;
use resource_sync::ResourceHeader;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Fabric {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub fabric_type: String,
    pub max_zones: u32,
}

mirrored!(Fabric, Shared);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Switch {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub switch_type: String,
    pub model: String,
}

mirrored!(Switch, ParentSpace);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Port {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub port_id: String,
    pub port_protocol: String,
    pub current_speed_gbps: u32,
    pub width: u32,
}

mirrored!(Port, ParentSpace);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Zone {
    #[serde(flatten)]
    pub header: ResourceHeader,
}

mirrored!(Zone, ParentSpace);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Endpoint {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub endpoint_protocol: String,
    pub identifier: String,
}

mirrored!(Endpoint, ParentSpace);
