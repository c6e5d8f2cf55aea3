//! # Sync Engine
//!
//! The facade the rest of the service talks to. [`SyncEngine`] owns the
//! [`HandlerRegistry`], the set of connected agents and the per-agent
//! [`TransactionManager`], and exposes the top-level operations:
//!
//! - **Notifications** from an agent are applied in one `NotificationHandle` transaction.
//! - **Polling** lists the agent's root collection and polls every member from the root.
//! - **REST writes** call [`load`](SyncEngine::load), [`load_collection`](SyncEngine::load_collection)
//!   or [`remove`](SyncEngine::remove) after their own agent mutation.
//! - **Agent retirement** removes everything the agent owned.
//!
//! ```text
//!   agent events ──► process_notification ─┐
//!   poll tick    ──► poll_agent ───────────┼──► Handler ──► Store ──► Publisher
//!   REST write   ──► load / remove ────────┘
//! ```

use crate::agent::AgentHandle;
use crate::config::EngineConfig;
use crate::context::{Context, Mode};
use crate::error::{SyncError, SyncResult};
use crate::handler::Notification;
use crate::model::{CollectionType, Component, Health};
use crate::registry::HandlerRegistry;
use crate::transaction::TransactionManager;
use crate::visitor::HealthRollup;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};

/// Notifications reported together by one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationBatch {
    pub agent_id: String,
    pub notifications: Vec<Notification>,
}

impl NotificationBatch {
    pub fn new(agent_id: impl Into<String>, notifications: Vec<Notification>) -> Self {
        Self {
            agent_id: agent_id.into(),
            notifications,
        }
    }
}

pub struct SyncEngine {
    registry: Arc<HandlerRegistry>,
    agents: RwLock<HashMap<String, AgentHandle>>,
    transactions: TransactionManager,
}

impl SyncEngine {
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            agents: RwLock::new(HashMap::new()),
            transactions: TransactionManager::new(),
        }
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        self.registry.config()
    }

    pub fn transactions(&self) -> &TransactionManager {
        &self.transactions
    }

    pub fn attach_agent(&self, agent: AgentHandle) {
        let id = agent.id().to_string();
        info!(agent = %id, "Agent attached");
        self.agents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, agent);
    }

    pub fn agent(&self, agent_id: &str) -> SyncResult<AgentHandle> {
        self.agents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(agent_id)
            .cloned()
            .ok_or_else(|| SyncError::UnknownAgent(agent_id.to_string()))
    }

    pub fn agent_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .agents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    /// Removes every resource owned by `agent_id` and forgets the agent.
    pub async fn detach_agent(&self, agent_id: &str) -> SyncResult<()> {
        let agent = self.agent(agent_id)?;
        let registry = self.registry.clone();
        self.transactions
            .run(agent_id, "AgentDisappeared", async {
                let mut ctx = Context::new(Mode::AgentDisappeared, Some(agent), registry.clone());
                for handler in registry.handlers() {
                    handler.remove_agent_data(&mut ctx, agent_id);
                }
                let rows: usize = registry
                    .associations()
                    .iter()
                    .map(|t| t.remove_agent(agent_id))
                    .sum();
                info!(
                    agent = %agent_id,
                    removed = ctx.events().len(),
                    associations = rows,
                    "Agent data removed"
                );
                ctx.publish();
            })
            .await;

        self.agents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(agent_id);
        self.transactions.forget(agent_id);
        Ok(())
    }

    /// Applies a batch of agent notifications. Returns how many failed.
    pub async fn process_notification(&self, batch: NotificationBatch) -> SyncResult<usize> {
        let agent = self.agent(&batch.agent_id)?;
        let registry = self.registry.clone();
        let failed = self
            .transactions
            .run(&batch.agent_id, "NotificationHandle", async {
                let mut failed = 0;
                for notification in &batch.notifications {
                    let handled = match registry.handler_for(notification.component) {
                        Ok(handler) => handler.handle(agent.clone(), notification).await,
                        Err(e) => {
                            error!(uuid = %notification.uuid, error = %e, "No handler for notification");
                            false
                        }
                    };
                    if !handled {
                        failed += 1;
                    }
                }
                failed
            })
            .await;
        if failed > 0 {
            warn!(agent = %batch.agent_id, failed, total = batch.notifications.len(), "Notifications failed");
        }
        Ok(failed)
    }

    /// Polls every root resource of `agent_id`, removing roots the agent no longer lists.
    pub async fn poll_agent(&self, agent_id: &str) -> SyncResult<()> {
        let agent = self.agent(agent_id)?;
        let registry = self.registry.clone();
        let root = self.config().service.root_collection;
        self.transactions
            .run(agent_id, "Polling", async {
                let handler = registry.handler_for_collection(root)?;
                let listed = agent.list_members("", &root.to_string()).await?;
                for uuid in &listed {
                    handler
                        .poll(agent.clone(), "", Component::None, uuid)
                        .await;
                }

                let listed: HashSet<&String> = listed.iter().collect();
                let mut ctx = Context::new(Mode::Polling, Some(agent.clone()), registry.clone());
                for uuid in handler.keys("") {
                    let owned = handler
                        .describe(&uuid)
                        .is_some_and(|r| r.agent_id == agent_id);
                    if owned && !listed.contains(&uuid) {
                        info!(agent = %agent_id, %uuid, "Root resource gone");
                        if handler.do_remove(&mut ctx, &uuid).is_ok() {
                            ctx.counters.removed += 1;
                        }
                    }
                }
                ctx.publish();
                Ok::<(), SyncError>(())
            })
            .await
    }

    /// Polls every attached agent; failures are logged per agent.
    pub async fn poll_all(&self) {
        for agent_id in self.agent_ids() {
            if let Err(e) = self.poll_agent(&agent_id).await {
                error!(agent = %agent_id, error = %e, "Poll failed");
            }
        }
    }

    /// Re-synchronizes one resource after a REST write.
    pub async fn load(
        &self,
        agent_id: &str,
        component: Component,
        parent: &str,
        uuid: &str,
        recursively: bool,
    ) -> SyncResult<u64> {
        let agent = self.agent(agent_id)?;
        let handler = self.registry.handler_for(component)?;
        let parent_type = self.registry.find_component(parent);
        self.transactions
            .run(agent_id, "Load", async {
                handler
                    .load(agent, parent, parent_type, uuid, recursively)
                    .await
            })
            .await
    }

    /// Re-synchronizes the collections of `parent` with kind `collection_type`.
    pub async fn load_collection(
        &self,
        agent_id: &str,
        parent: &str,
        collection_type: CollectionType,
        recursively: bool,
    ) -> SyncResult<()> {
        let agent = self.agent(agent_id)?;
        let component = self.registry.find_component(parent);
        let handler = self.registry.handler_for(component)?;
        let parent_type = handler
            .describe(parent)
            .map(|r| r.parent_type)
            .unwrap_or_default();
        self.transactions
            .run(agent_id, "LoadCollection", async {
                handler
                    .load_collection(agent, parent, parent_type, collection_type, recursively)
                    .await
            })
            .await
    }

    /// Removes a resource and its subtree on behalf of a user.
    ///
    /// Runs in a `Remove` transaction of the owning agent, so it waits for an in-flight
    /// poll or load of that agent instead of racing it.
    pub async fn remove(&self, component: Component, uuid: &str) -> SyncResult<bool> {
        let handler = self.registry.handler_for(component)?;
        let Some(owner) = handler.describe(uuid) else {
            debug!(%component, %uuid, "Nothing to remove");
            return Ok(false);
        };
        let removed = self
            .transactions
            .run(&owner.agent_id, "Remove", async {
                debug!(%component, %uuid, "User removal");
                handler.remove(uuid)
            })
            .await;
        Ok(removed)
    }

    /// Worst health below (and including) `uuid`, optionally restricted to one kind.
    pub fn health_rollup(
        &self,
        component: Component,
        uuid: &str,
        filter: Option<Component>,
    ) -> SyncResult<Health> {
        let handler = self.registry.handler_for(component)?;
        if !handler.contains(uuid) {
            return Err(SyncError::NotFound(uuid.to_string()));
        }
        let mut rollup = HealthRollup::new(filter);
        handler.accept(&mut rollup, uuid);
        Ok(rollup.health())
    }
}
