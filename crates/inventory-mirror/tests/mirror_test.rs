use inventory_mirror::agent::SnapshotAgent;
use inventory_mirror::lifecycle::MirrorSystem;
use inventory_mirror::MirrorError;
use resource_sync::{
    Component, EngineConfig, Event, EventType, Handler, Health, Notification, NotificationBatch,
    NotificationKind,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

const AGENT_ID: &str = "agent-1";
const RESOURCES: usize = 19;

fn demo_agent() -> Arc<SnapshotAgent> {
    Arc::new(
        SnapshotAgent::from_json(AGENT_ID, include_str!("../fixtures/demo_inventory.json"))
            .expect("fixture parses"),
    )
}

/// A running mirror without the poll timer, with the demo agent attached.
fn mirror() -> (MirrorSystem, Arc<SnapshotAgent>) {
    let mut config = EngineConfig::default();
    config.eventing.poll_interval_secs = 0;
    let system = MirrorSystem::new(config);
    let agent = demo_agent();
    system.attach(agent.clone()).expect("first attach");
    (system, agent)
}

fn drain(receiver: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn poll_mirrors_every_kind() {
    let (system, _agent) = mirror();
    system.engine.poll_agent(AGENT_ID).await.unwrap();

    let h = &system.handlers;
    assert_eq!(h.manager.len(), 1);
    assert_eq!(h.chassis.len(), 1);
    assert_eq!(h.system.keys("mgr-1"), vec!["sys-1"]);
    assert_eq!(h.processor.keys("sys-1"), vec!["cpu-1", "cpu-2"]);
    assert_eq!(h.memory.len(), 1);
    assert_eq!(h.drive.keys("stor-1"), vec!["drive-1"]);
    assert_eq!(h.vlan.keys("port-1"), vec!["vlan-10"]);
    assert_eq!(h.acl_rule.keys("acl-1"), vec!["rule-1"]);
    assert_eq!(h.port.keys("fsw-1"), vec!["fport-1"]);
    assert_eq!(h.endpoint.keys("fab-1"), vec!["ep-1", "ep-2"]);
    assert_eq!(h.zone_endpoints.members("zone-1"), vec!["ep-1"]);

    let bios = h.system.get("sys-1").unwrap().bios_version;
    assert_eq!(bios, "2.1");

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn events_carry_rest_paths() {
    let (system, _agent) = mirror();
    let mut events = system.subscribe();
    system.engine.poll_agent(AGENT_ID).await.unwrap();

    let events = drain(&mut events);
    assert_eq!(events.len(), RESOURCES);
    assert!(events.iter().all(|e| e.event_type == EventType::ResourceAdded));

    let origin = |uuid: &str| {
        events
            .iter()
            .find(|e| e.uuid == uuid)
            .and_then(|e| e.origin.clone())
    };
    assert_eq!(origin("mgr-1").as_deref(), Some("/redfish/v1/Managers/1"));
    assert_eq!(
        origin("vlan-10").as_deref(),
        Some("/redfish/v1/EthernetSwitches/1/Ports/1/VLANs/1")
    );
    assert_eq!(
        origin("rule-1").as_deref(),
        Some("/redfish/v1/EthernetSwitches/1/ACLs/1/Rules/1")
    );
    assert_eq!(
        origin("cpu-2").as_deref(),
        Some("/redfish/v1/Systems/1/Processors/2")
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn health_rolls_up_through_the_tree() {
    let (system, _agent) = mirror();
    system.engine.poll_agent(AGENT_ID).await.unwrap();

    let health = system
        .engine
        .health_rollup(Component::Manager, "mgr-1", None)
        .unwrap();
    assert_eq!(health, Health::Warning);

    let processors = system
        .engine
        .health_rollup(Component::Manager, "mgr-1", Some(Component::Processor))
        .unwrap();
    assert_eq!(processors, Health::Ok);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn poll_prunes_what_the_agent_dropped() {
    let (system, agent) = mirror();
    system.engine.poll_agent(AGENT_ID).await.unwrap();

    agent.drop_resource("stor-1");
    agent.drop_resource("ep-1");
    system.engine.poll_agent(AGENT_ID).await.unwrap();

    let h = &system.handlers;
    assert!(h.storage_subsystem.is_empty());
    assert!(h.drive.is_empty());
    assert_eq!(h.endpoint.keys("fab-1"), vec!["ep-2"]);
    assert!(h.zone_endpoints.is_empty());
    assert_eq!(h.processor.len(), 2);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn unreachable_agent_keeps_the_mirror() {
    let (system, agent) = mirror();
    system.engine.poll_agent(AGENT_ID).await.unwrap();

    agent.set_reachable(false);
    let err = system.engine.poll_agent(AGENT_ID).await.unwrap_err();

    assert!(err.is_unreachable());
    assert_eq!(system.handlers.processor.len(), 2);
    assert_eq!(system.handlers.endpoint.len(), 2);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn notifications_flow_through_the_watcher() {
    let (system, agent) = mirror();
    system.engine.poll_agent(AGENT_ID).await.unwrap();
    let mut events = system.subscribe();

    agent.put_resource("cpu-3", json!({ "status": { "health": "OK" }, "socket": "CPU 2" }));
    agent.set_members("sys-1", "Processors", &["cpu-1", "cpu-2", "cpu-3"]);
    system
        .notify(NotificationBatch::new(
            AGENT_ID,
            vec![Notification::new(
                Component::Processor,
                NotificationKind::Add,
                "sys-1",
                "cpu-3",
            )],
        ))
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("event within timeout")
        .unwrap();
    assert_eq!(event.event_type, EventType::ResourceAdded);
    assert_eq!(event.origin.as_deref(), Some("/redfish/v1/Systems/1/Processors/3"));
    assert_eq!(
        system.handlers.processor.get("cpu-3").unwrap().header.parent_type,
        Component::System
    );

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn duplicate_attach_is_rejected() {
    let (system, _agent) = mirror();
    let err = system.attach(demo_agent()).unwrap_err();
    assert!(matches!(err, MirrorError::DuplicateAgent(id) if id == AGENT_ID));
    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_retires_agent_inventory() {
    let (system, _agent) = mirror();
    system.engine.poll_agent(AGENT_ID).await.unwrap();
    let mut events = system.subscribe();

    system.shutdown().await.unwrap();

    let removed = drain(&mut events);
    assert_eq!(removed.len(), RESOURCES);
    assert!(removed
        .iter()
        .all(|e| e.event_type == EventType::ResourceRemoved));
}
