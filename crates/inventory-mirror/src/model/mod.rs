//! # Inventory Model
//!
//! Pure data structures for every hardware kind the mirror keeps. Each type embeds the
//! engine's [`ResourceHeader`] and adds the attributes agents report for that kind.
//!
//! Agents send camelCase JSON; every attribute defaults when absent so a sparse agent
//! payload still decodes.
//!
//! | Area | Kinds |
//! |------|-------|
//! | [`compute`] | Manager, Chassis, System, Processor, Memory, StorageSubsystem, Drive |
//! | [`network`] | EthernetSwitch, EthernetSwitchPort, Vlan, Acl, AclRule, StaticMac |
//! | [`storage`] | StorageService, StoragePool, Volume |
//! | [`fabric`] | Fabric, Switch, Port, Zone, Endpoint |

/// Implements [`ResourceModel`](resource_sync::ResourceModel) for a struct with a `header` field.
macro_rules! mirrored {
    ($model:ident, $zone:ident) => {
        impl resource_sync::ResourceModel for $model {
            const COMPONENT: resource_sync::Component = resource_sync::Component::$model;
            const NUMBERING: resource_sync::id_policy::NumberingZone =
                resource_sync::id_policy::NumberingZone::$zone;

            fn header(&self) -> &resource_sync::ResourceHeader {
                &self.header
            }

            fn header_mut(&mut self) -> &mut resource_sync::ResourceHeader {
                &mut self.header
            }
        }
    };
}

pub(crate) use mirrored;

pub mod compute;
pub mod fabric;
pub mod network;
pub mod storage;

pub use compute::*;
pub use fabric::*;
pub use network::*;
pub use storage::*;

#[cfg(test)]
mod tests {
    use super::*;
    use resource_sync::id_policy::NumberingZone;
    use resource_sync::{CollectionType, Component, Health, ResourceModel};
    use serde_json::json;

    #[test]
    fn top_level_kinds_share_numbering() {
        assert_eq!(Manager::NUMBERING, NumberingZone::Shared);
        assert_eq!(Chassis::NUMBERING, NumberingZone::Shared);
        assert_eq!(System::NUMBERING, NumberingZone::Shared);
        assert_eq!(EthernetSwitch::NUMBERING, NumberingZone::Shared);
        assert_eq!(StorageService::NUMBERING, NumberingZone::Shared);
        assert_eq!(Fabric::NUMBERING, NumberingZone::Shared);
        assert_eq!(Processor::NUMBERING, NumberingZone::ParentSpace);
        assert_eq!(AclRule::NUMBERING, NumberingZone::ParentSpace);
        assert_eq!(Endpoint::NUMBERING, NumberingZone::ParentSpace);
    }

    #[test]
    fn system_decodes_agent_payload() {
        let system: System = serde_json::from_value(json!({
            "status": { "state": "Enabled", "health": "Warning" },
            "collections": [{ "name": "Processors", "type": "Processors" }],
            "manufacturer": "Acme",
            "model": "X1",
            "biosVersion": "2.1",
            "powerState": "On"
        }))
        .unwrap();

        assert_eq!(system.header.status.health, Some(Health::Warning));
        assert_eq!(system.header.collections[0].collection_type, CollectionType::Processors);
        assert_eq!(system.bios_version, "2.1");
        assert_eq!(system.power_state, "On");
        assert_eq!(System::fetch_request("sys-1").command, "getSystemInfo");
    }

    #[test]
    fn sparse_payload_uses_defaults() {
        let port: EthernetSwitchPort = serde_json::from_value(json!({})).unwrap();
        assert_eq!(port.speed_mbps, 0);
        assert!(port.header.collections.is_empty());
        assert_eq!(EthernetSwitchPort::COMPONENT, Component::EthernetSwitchPort);
    }
}
