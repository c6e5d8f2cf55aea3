//! # Inventory Mirror Demo
//!
//! Runs a complete mirror against a [`SnapshotAgent`] seeded from
//! `fixtures/demo_inventory.json` and walks through the three ways the mirror changes:
//!
//! 1. A full poll of the agent.
//! 2. An agent notification (a processor is hot-added).
//! 3. A user removal through the engine.
//!
//! Settings come from `mirror.toml` (or the file named by `MIRROR_CONFIG`); a missing file
//! means defaults.

use inventory_mirror::agent::SnapshotAgent;
use inventory_mirror::lifecycle::MirrorSystem;
use inventory_mirror::MirrorError;
use resource_sync::tracing::setup_tracing;
use resource_sync::{
    Component, EngineConfig, Handler, Notification, NotificationBatch, NotificationKind,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Instrument};

const AGENT_ID: &str = "agent-1";

#[tokio::main]
async fn main() -> Result<(), MirrorError> {
    setup_tracing();

    let path = std::env::var("MIRROR_CONFIG").unwrap_or_else(|_| "mirror.toml".to_string());
    let config = EngineConfig::load(&path)?;
    info!(%path, "Starting inventory mirror");

    let system = MirrorSystem::new(config);

    let mut log = system.subscribe();
    let listener = tokio::spawn(async move {
        while let Ok(event) = log.recv().await {
            info!(
                event = ?event.event_type,
                component = %event.component,
                origin = event.origin.as_deref().unwrap_or("-"),
                "Event"
            );
        }
    });

    let agent = Arc::new(SnapshotAgent::from_json(
        AGENT_ID,
        include_str!("../fixtures/demo_inventory.json"),
    )?);
    system.attach(agent.clone())?;

    async {
        system.engine.poll_agent(AGENT_ID).await?;
        info!(
            systems = system.handlers.system.len(),
            processors = system.handlers.processor.len(),
            ports = system.handlers.ethernet_switch_port.len(),
            zone_members = system.handlers.zone_endpoints.len(),
            "Inventory mirrored"
        );
        Ok::<(), MirrorError>(())
    }
    .instrument(tracing::info_span!("initial_poll"))
    .await?;

    let mut updates = system.subscribe();
    async {
        agent.put_resource(
            "cpu-3",
            json!({ "status": { "state": "Enabled", "health": "OK" }, "socket": "CPU 2" }),
        );
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
            .await?;

        match tokio::time::timeout(Duration::from_secs(2), updates.recv()).await {
            Ok(Ok(event)) => info!(origin = ?event.origin, "Hot-add mirrored"),
            _ => warn!("Hot-add not observed"),
        }
        Ok::<(), MirrorError>(())
    }
    .instrument(tracing::info_span!("agent_event"))
    .await?;

    let health = system
        .engine
        .health_rollup(Component::Manager, "mgr-1", None)?;
    info!(?health, "Manager health rollup");

    async {
        agent.drop_resource("drive-1");
        let removed = system.engine.remove(Component::Drive, "drive-1").await?;
        let health = system
            .engine
            .health_rollup(Component::Manager, "mgr-1", None)?;
        info!(removed, ?health, "Drive retired");
        Ok::<(), MirrorError>(())
    }
    .instrument(tracing::info_span!("user_removal"))
    .await?;

    system.shutdown().await?;
    if listener.await.is_err() {
        warn!("Event listener ended abnormally");
    }

    info!("Demo completed successfully");
    Ok(())
}
