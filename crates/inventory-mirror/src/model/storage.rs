//! Storage service kinds.

use super::mirrored;
use resource_sync::ResourceHeader;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageService {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub description: String,
}

mirrored!(StorageService, Shared);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoragePool {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub capacity_bytes: u64,
    pub allocated_bytes: u64,
}

mirrored!(StoragePool, ParentSpace);

/// A volume carved from a storage pool.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Volume {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub capacity_bytes: u64,
    pub bootable: bool,
    pub encrypted: bool,
}

mirrored!(Volume, ParentSpace);
