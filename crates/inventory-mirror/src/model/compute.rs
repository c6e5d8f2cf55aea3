//! Compute kinds: managers, chassis, systems and the parts inside them.

use super::mirrored;
use resource_sync::ResourceHeader;
use serde::{Deserialize, Serialize};

/// A management controller. Polling starts from the managers an agent lists at its root.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Manager {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub manager_type: String,
    pub firmware_version: String,
    pub model: String,
}

mirrored!(Manager, Shared);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Chassis {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub chassis_type: String,
    pub manufacturer: String,
    pub serial_number: String,
    pub asset_tag: String,
}

mirrored!(Chassis, Shared);

/// A computer system (a server blade or sled).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct System {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub bios_version: String,
    pub power_state: String,
}

mirrored!(System, Shared);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Processor {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub socket: String,
    pub model: String,
    pub total_cores: u32,
    pub total_threads: u32,
    pub max_speed_mhz: u32,
}

mirrored!(Processor, ParentSpace);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Memory {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub device_locator: String,
    pub memory_type: String,
    pub capacity_mib: u64,
    pub operating_speed_mhz: u32,
}

mirrored!(Memory, ParentSpace);

/// Storage controller subsystem of a system. Holds the system's drives.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageSubsystem {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub controller_model: String,
}

mirrored!(StorageSubsystem, ParentSpace);

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Drive {
    #[serde(flatten)]
    pub header: ResourceHeader,
    pub media_type: String,
    pub protocol: String,
    pub capacity_bytes: u64,
    pub serial_number: String,
}

mirrored!(Drive, ParentSpace);
