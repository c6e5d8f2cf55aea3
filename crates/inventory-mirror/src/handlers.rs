//! # Handler Wiring
//!
//! One [`GenericHandler`] per inventory kind, named `<Kind>Handler`, plus the collection
//! kinds each handler answers for. [`Handlers::registry`] assembles them into a
//! [`HandlerRegistry`].
//!
//! The table below is the whole inventory schema as far as routing is concerned. Parent and
//! child relations are not listed: handlers learn them from the collections agents report.
//!
//! ```rust,ignore
//! inventory_handlers! {
//!     System => [Systems],
//!     Zone => [Zones] links zone_endpoints as "Endpoints",
//! }
//! ```
//!
//! expands to `SystemHandler`, `ZoneHandler`, a `Handlers` struct with `system`, `zone` and
//! `zone_endpoints` fields, and the registration code.

use crate::model::*;
use paste::paste;
use resource_sync::association::AssociationTable;
use resource_sync::{CollectionType, EventPublisher, GenericHandler, HandlerRegistry};
use std::sync::Arc;
use tracing::debug;

macro_rules! inventory_handlers {
    ($(
        $model:ident => [$($collection:ident),+] $(links $table:ident as $link:literal)?
    ),+ $(,)?) => {
        paste! {
            $(
                #[doc = "Handler for [`" $model "`] resources."]
                pub type [<$model Handler>] = GenericHandler<$model>;
            )+

            /// Every inventory handler and association table.
            pub struct Handlers {
                $(pub [<$model:snake>]: Arc<[<$model Handler>]>,)+
                $($(pub $table: Arc<AssociationTable>,)?)+
            }

            impl Handlers {
                pub fn new() -> Self {
                    $($(let $table = Arc::new(AssociationTable::new(stringify!($table)));)?)+
                    Self {
                        $(
                            [<$model:snake>]: Arc::new(
                                [<$model Handler>]::new()
                                    $(.with_association($link, $table.clone()))?
                            ),
                        )+
                        $($($table,)?)+
                    }
                }

                /// Builds the registry around these handlers.
                pub fn registry(
                    &self,
                    publisher: Arc<dyn EventPublisher>,
                    config: resource_sync::EngineConfig,
                ) -> Arc<HandlerRegistry> {
                    let mut builder = HandlerRegistry::builder();
                    $(
                        debug!(component = stringify!($model), "Registering handler");
                        builder = builder.handler(
                            self.[<$model:snake>].clone(),
                            &[$(CollectionType::$collection),+],
                        );
                    )+
                    $($(builder = builder.association(self.$table.clone());)?)+
                    builder.publisher(publisher).config(config).build()
                }
            }
        }
    };
}

inventory_handlers! {
    Manager => [Managers],
    Chassis => [Chassis],
    System => [Systems],
    Processor => [Processors],
    Memory => [Memory],
    StorageSubsystem => [StorageSubsystems],
    Drive => [Drives],
    EthernetSwitch => [EthernetSwitches],
    EthernetSwitchPort => [EthernetSwitchPorts],
    Vlan => [Vlans],
    Acl => [Acls],
    AclRule => [Rules],
    StaticMac => [StaticMacs],
    StorageService => [StorageServices],
    StoragePool => [StoragePools],
    Volume => [Volumes],
    Fabric => [Fabrics],
    Switch => [Switches],
    Port => [Ports],
    Zone => [Zones] links zone_endpoints as "Endpoints",
    Endpoint => [Endpoints],
}

impl Default for Handlers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_sync::mock::RecordingPublisher;
    use resource_sync::{Component, EngineConfig, Handler};

    #[test]
    fn every_kind_is_routed() {
        let handlers = Handlers::new();
        let registry = handlers.registry(Arc::new(RecordingPublisher::new()), EngineConfig::default());

        assert_eq!(registry.handlers().count(), 21);
        assert_eq!(
            registry
                .handler_for_collection(CollectionType::Rules)
                .unwrap()
                .component(),
            Component::AclRule
        );
        assert_eq!(
            registry
                .handler_for_collection(CollectionType::EthernetSwitchPorts)
                .unwrap()
                .component(),
            Component::EthernetSwitchPort
        );
        assert_eq!(registry.associations().len(), 1);
        assert_eq!(registry.associations()[0].name(), "zone_endpoints");
    }
}
