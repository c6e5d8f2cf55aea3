use crate::error::MirrorError;
use crate::handlers::Handlers;
use resource_sync::watcher::Notifier;
use resource_sync::{
    AgentHandle, EngineConfig, Event, NotificationBatch, SubscriptionHub, SyncEngine, Watcher,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

/// The running inventory mirror.
///
/// `MirrorSystem` is responsible for:
/// - **Wiring**: one handler per kind, the association tables and the registry
/// - **Lifecycle**: starting the watcher task and stopping it again
/// - **Agents**: attaching agents and retiring their data on shutdown
///
/// # Example
///
/// ```ignore
/// let system = MirrorSystem::new(EngineConfig::default());
/// let mut events = system.subscribe();
///
/// system.attach(agent)?;
/// system.engine.poll_agent("agent-1").await?;
///
/// system.shutdown().await?;
/// ```
pub struct MirrorSystem {
    /// Facade for polls, loads and removals.
    pub engine: Arc<SyncEngine>,

    /// Direct access to every handler, mostly for queries.
    pub handlers: Handlers,

    hub: Arc<SubscriptionHub>,
    notifier: Notifier,
    watcher: Watcher,
}

impl MirrorSystem {
    /// Builds the registry and engine and starts the watcher.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(config: EngineConfig) -> Self {
        let hub = Arc::new(SubscriptionHub::new(config.eventing.subscriber_buffer));
        let handlers = Handlers::new();
        let registry = handlers.registry(hub.clone(), config);
        let engine = Arc::new(SyncEngine::new(registry));
        let (watcher, notifier) = Watcher::spawn(engine.clone());

        info!(
            poll_interval = ?engine.config().poll_interval(),
            root = %engine.config().service.root_collection,
            "Mirror system started"
        );

        Self {
            engine,
            handlers,
            hub,
            notifier,
            watcher,
        }
    }

    /// Receiver for every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.hub.subscribe()
    }

    /// Makes `agent` known to the engine. The next poll mirrors its inventory.
    pub fn attach(&self, agent: AgentHandle) -> Result<(), MirrorError> {
        let id = agent.id().to_string();
        if self.engine.agent(&id).is_ok() {
            return Err(MirrorError::DuplicateAgent(id));
        }
        self.engine.attach_agent(agent);
        Ok(())
    }

    /// Queues a notification batch for the watcher.
    pub async fn notify(&self, batch: NotificationBatch) -> Result<(), MirrorError> {
        self.notifier.send(batch).await.map_err(|e| {
            error!(agent = %e.0.agent_id, "Watcher is gone, notification dropped");
            MirrorError::WatcherStopped(e.0.agent_id)
        })
    }

    /// Stops the watcher, then retires every attached agent.
    ///
    /// Retiring removes the agent's resources from the mirror and publishes the removals,
    /// so subscribers see the inventory empty out before the hub goes away.
    pub async fn shutdown(self) -> Result<(), MirrorError> {
        info!("Shutting down mirror system...");

        drop(self.notifier);
        self.watcher.shutdown().await;

        let mut result = Ok(());
        for agent_id in self.engine.agent_ids() {
            if let Err(e) = self.engine.detach_agent(&agent_id).await {
                error!(agent = %agent_id, error = %e, "Agent retirement failed");
                result = Err(e.into());
            }
        }

        info!("Mirror system stopped");
        result
    }
}
