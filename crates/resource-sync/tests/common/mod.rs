#![allow(dead_code)]

use resource_sync::association::AssociationTable;
use resource_sync::id_policy::NumberingZone;
use resource_sync::mock::{MockAgent, RecordingPublisher};
use resource_sync::{
    AgentHandle, CollectionType, Component, EngineConfig, GenericHandler, HandlerRegistry,
    ResourceHeader, ResourceModel,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

macro_rules! test_model {
    ($name:ident, $component:ident, $zone:ident) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        pub struct $name {
            #[serde(flatten)]
            pub header: ResourceHeader,
            #[serde(default)]
            pub model: String,
        }

        impl ResourceModel for $name {
            const COMPONENT: Component = Component::$component;
            const NUMBERING: NumberingZone = NumberingZone::$zone;
            fn header(&self) -> &ResourceHeader {
                &self.header
            }
            fn header_mut(&mut self) -> &mut ResourceHeader {
                &mut self.header
            }
        }
    };
}

test_model!(TestManager, Manager, Shared);
test_model!(TestSystem, System, Shared);
test_model!(TestProcessor, Processor, ParentSpace);
test_model!(TestMemory, Memory, ParentSpace);

pub struct Harness {
    pub agent: Arc<MockAgent>,
    pub publisher: Arc<RecordingPublisher>,
    pub registry: Arc<HandlerRegistry>,
    pub managers: Arc<GenericHandler<TestManager>>,
    pub systems: Arc<GenericHandler<TestSystem>>,
    pub processors: Arc<GenericHandler<TestProcessor>>,
    pub memory: Arc<GenericHandler<TestMemory>>,
    pub endpoints: Arc<AssociationTable>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let agent = Arc::new(MockAgent::new("agent-1"));
        let publisher = Arc::new(RecordingPublisher::new());
        let endpoints = Arc::new(AssociationTable::new("system-endpoints"));
        let managers = Arc::new(GenericHandler::<TestManager>::new());
        let systems = Arc::new(
            GenericHandler::<TestSystem>::new().with_association("Endpoints", endpoints.clone()),
        );
        let processors = Arc::new(GenericHandler::<TestProcessor>::new());
        let memory = Arc::new(GenericHandler::<TestMemory>::new());

        let registry = HandlerRegistry::builder()
            .handler(managers.clone(), &[CollectionType::Managers])
            .handler(systems.clone(), &[CollectionType::Systems])
            .handler(processors.clone(), &[CollectionType::Processors])
            .handler(memory.clone(), &[CollectionType::Memory])
            .association(endpoints.clone())
            .publisher(publisher.clone())
            .config(config)
            .build();

        Self {
            agent,
            publisher,
            registry,
            managers,
            systems,
            processors,
            memory,
            endpoints,
        }
    }

    pub fn handle(&self) -> AgentHandle {
        self.agent.clone()
    }

    /// A system declaring Processors and Memory, with the given processors.
    pub fn system(&self, uuid: &str, processors: &[&str]) {
        self.agent.expect_fetch(uuid).return_ok(resource(
            "OK",
            &[("Processors", "Processors"), ("Memory", "Memory")],
        ));
        self.agent
            .expect_members(uuid, "Processors")
            .return_ok(processors);
        self.agent.expect_members(uuid, "Memory").return_ok::<&str>(&[]);
        self.agent.expect_members(uuid, "Endpoints").return_ok::<&str>(&[]);
        for processor in processors {
            self.agent
                .expect_fetch(processor)
                .return_ok(resource("OK", &[]));
        }
    }
}

/// Agent JSON of a resource with the given health and collections.
pub fn resource(health: &str, collections: &[(&str, &str)]) -> Value {
    let collections: Vec<Value> = collections
        .iter()
        .map(|(name, kind)| json!({ "name": name, "type": kind, "slotMask": "" }))
        .collect();
    json!({
        "status": { "state": "Enabled", "health": health },
        "collections": collections,
    })
}
