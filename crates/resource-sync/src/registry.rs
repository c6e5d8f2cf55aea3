//! # Handler Registry
//!
//! Maps resource kinds and collection kinds to the [`Handler`] that owns them, and carries
//! the collaborators every operation needs: the event publisher, the locator that resolves
//! event references, the association tables and the engine configuration.
//!
//! ## Construction
//!
//! The registry is built once with [`RegistryBuilder`] and shared as `Arc<HandlerRegistry>`.
//! Handlers need to reach the registry to delegate, but the registry owns the handlers, so
//! [`RegistryBuilder::build`] hands each handler a `Weak` back-reference after the `Arc`
//! exists (late binding). There is no process-wide singleton.
//!
//! ```rust,ignore
//! let registry = RegistryBuilder::new()
//!     .handler(Arc::new(GenericHandler::<System>::new()), &[CollectionType::Systems])
//!     .handler(Arc::new(GenericHandler::<Processor>::new()), &[CollectionType::Processors])
//!     .publisher(hub.clone())
//!     .build();
//! ```

use crate::association::AssociationTable;
use crate::config::EngineConfig;
use crate::error::{SyncError, SyncResult};
use crate::event::{EventPublisher, SubscriptionHub};
use crate::handler::Handler;
use crate::locator::{RedfishLocator, ResourceLocator, ResourceRef};
use crate::model::{Collection, CollectionType, Component};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error};

pub struct HandlerRegistry {
    handlers: HashMap<Component, Arc<dyn Handler>>,
    collections: HashMap<CollectionType, Component>,
    associations: Vec<Arc<AssociationTable>>,
    publisher: Arc<dyn EventPublisher>,
    locator: Box<dyn ResourceLocator>,
    config: EngineConfig,
}

impl HandlerRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn handler_for(&self, component: Component) -> SyncResult<Arc<dyn Handler>> {
        self.handlers
            .get(&component)
            .cloned()
            .ok_or_else(|| SyncError::HandlerNotDefined(component.to_string()))
    }

    pub fn handler_for_collection(
        &self,
        collection_type: CollectionType,
    ) -> SyncResult<Arc<dyn Handler>> {
        let component = self
            .collections
            .get(&collection_type)
            .ok_or_else(|| SyncError::HandlerNotDefined(collection_type.to_string()))?;
        self.handler_for(*component)
    }

    /// Resolves declared collections to `(name, handler)` pairs, skipping unknown kinds.
    pub fn handlers_for(&self, collections: &[Collection]) -> Vec<(String, Arc<dyn Handler>)> {
        collections
            .iter()
            .filter_map(|c| match self.handler_for_collection(c.collection_type) {
                Ok(handler) => Some((c.name.clone(), handler)),
                Err(e) => {
                    error!(collection = %c.name, error = %e, "Skipping collection");
                    None
                }
            })
            .collect()
    }

    /// Kind of the stored resource with `uuid`, `Component::None` when unknown.
    pub fn find_component(&self, uuid: &str) -> Component {
        self.handlers
            .values()
            .find(|h| h.contains(uuid))
            .map(|h| h.component())
            .unwrap_or_default()
    }

    pub fn describe(&self, component: Component, uuid: &str) -> Option<ResourceRef> {
        self.handlers.get(&component)?.describe(uuid)
    }

    /// External reference of a stored resource.
    pub fn locate(&self, component: Component, uuid: &str) -> Option<String> {
        self.locator.locate(self, component, uuid)
    }

    pub fn handlers(&self) -> impl Iterator<Item = &Arc<dyn Handler>> {
        self.handlers.values()
    }

    pub fn associations(&self) -> &[Arc<AssociationTable>] {
        &self.associations
    }

    /// Drops every association row mentioning `uuid`.
    pub fn forget_associations(&self, uuid: &str) -> usize {
        self.associations.iter().map(|t| t.forget(uuid)).sum()
    }

    pub fn publisher(&self) -> &Arc<dyn EventPublisher> {
        &self.publisher
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

pub struct RegistryBuilder {
    handlers: Vec<(Arc<dyn Handler>, Vec<CollectionType>)>,
    associations: Vec<Arc<AssociationTable>>,
    publisher: Option<Arc<dyn EventPublisher>>,
    locator: Option<Box<dyn ResourceLocator>>,
    config: EngineConfig,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            associations: Vec::new(),
            publisher: None,
            locator: None,
            config: EngineConfig::default(),
        }
    }

    /// Registers `handler` for its kind and for each of `collections`.
    pub fn handler(mut self, handler: Arc<dyn Handler>, collections: &[CollectionType]) -> Self {
        self.handlers.push((handler, collections.to_vec()));
        self
    }

    pub fn association(mut self, table: Arc<AssociationTable>) -> Self {
        self.associations.push(table);
        self
    }

    pub fn publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn locator(mut self, locator: Box<dyn ResourceLocator>) -> Self {
        self.locator = Some(locator);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Arc<HandlerRegistry> {
        let mut handlers = HashMap::new();
        let mut collections = HashMap::new();
        for (handler, types) in self.handlers {
            let component = handler.component();
            for collection_type in types {
                collections.insert(collection_type, component);
            }
            debug!(%component, "Registered handler");
            handlers.insert(component, handler);
        }

        let config = self.config;
        let publisher = self.publisher.unwrap_or_else(|| {
            Arc::new(SubscriptionHub::new(config.eventing.subscriber_buffer))
        });
        let locator = self
            .locator
            .unwrap_or_else(|| Box::new(RedfishLocator::new(config.service.url_prefix.clone())));

        let registry = Arc::new(HandlerRegistry {
            handlers,
            collections,
            associations: self.associations,
            publisher,
            locator,
            config,
        });
        for handler in registry.handlers.values() {
            handler.bind(Arc::downgrade(&registry));
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::GenericHandler;
    use crate::id_policy::NumberingZone;
    use crate::model::{ResourceHeader, ResourceModel};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Blade {
        #[serde(flatten)]
        header: ResourceHeader,
    }

    impl ResourceModel for Blade {
        const COMPONENT: Component = Component::System;
        const NUMBERING: NumberingZone = NumberingZone::Shared;
        fn header(&self) -> &ResourceHeader {
            &self.header
        }
        fn header_mut(&mut self) -> &mut ResourceHeader {
            &mut self.header
        }
    }

    fn blade(uuid: &str) -> Blade {
        let mut header = ResourceHeader::default();
        header.uuid = uuid.to_string();
        header.id = 4;
        Blade { header }
    }

    #[test]
    fn routes_by_kind_and_collection() {
        let blades = Arc::new(GenericHandler::<Blade>::new());
        blades.store().upsert(blade("b-1"));
        let registry = RegistryBuilder::new()
            .handler(blades.clone(), &[CollectionType::Systems])
            .build();

        assert_eq!(registry.find_component("b-1"), Component::System);
        assert_eq!(registry.find_component("b-2"), Component::None);
        assert!(registry.handler_for_collection(CollectionType::Systems).is_ok());
        assert!(matches!(
            registry.handler_for(Component::Drive),
            Err(SyncError::HandlerNotDefined(_))
        ));
        assert_eq!(
            registry.locate(Component::System, "b-1").as_deref(),
            Some("/redfish/v1/Systems/4")
        );
    }

    #[test]
    fn unknown_collections_are_skipped() {
        let registry = RegistryBuilder::new()
            .handler(Arc::new(GenericHandler::<Blade>::new()), &[CollectionType::Systems])
            .build();
        let resolved = registry.handlers_for(&[
            Collection::new("Systems", CollectionType::Systems),
            Collection::new("Drives", CollectionType::Drives),
        ]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].0, "Systems");
    }
}
