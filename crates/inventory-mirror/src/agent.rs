//! # Snapshot Agent
//!
//! [`SnapshotAgent`] is an [`AgentClient`] backed by an in-memory inventory snapshot. It
//! stands in for a hardware agent in the demo binary and in end-to-end tests: the snapshot
//! can be edited while the mirror is running, and connectivity can be switched off.
//!
//! ## Snapshot Format
//!
//! ```json
//! {
//!   "resources": {
//!     "sys-1": { "status": { "health": "OK" }, "collections": [{ "name": "Processors", "type": "Processors" }] }
//!   },
//!   "members": {
//!     "": { "Managers": ["mgr-1"] },
//!     "sys-1": { "Processors": ["cpu-1"] }
//!   }
//! }
//! ```
//!
//! The empty parent key holds the collections listed at the agent root.

use crate::error::MirrorError;
use async_trait::async_trait;
use resource_sync::agent::{AgentClient, FetchRequest};
use resource_sync::error::{AgentError, AgentResult};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

#[derive(Debug, Default, Deserialize)]
struct Snapshot {
    #[serde(default)]
    resources: HashMap<String, Value>,
    #[serde(default)]
    members: HashMap<String, HashMap<String, Vec<String>>>,
}

pub struct SnapshotAgent {
    id: String,
    snapshot: RwLock<Snapshot>,
    reachable: AtomicBool,
}

impl SnapshotAgent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            snapshot: RwLock::new(Snapshot::default()),
            reachable: AtomicBool::new(true),
        }
    }

    /// Builds an agent from a JSON snapshot document.
    pub fn from_json(id: impl Into<String>, json: &str) -> Result<Self, MirrorError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        let agent = Self::new(id);
        debug!(
            agent = %agent.id,
            resources = snapshot.resources.len(),
            parents = snapshot.members.len(),
            "Snapshot loaded"
        );
        *agent.write() = snapshot;
        Ok(agent)
    }

    fn read(&self) -> RwLockReadGuard<'_, Snapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Snapshot> {
        self.snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Inserts or replaces the agent's representation of `uuid`.
    pub fn put_resource(&self, uuid: &str, value: Value) {
        self.write().resources.insert(uuid.to_string(), value);
    }

    /// Forgets `uuid` and takes it out of every member list.
    pub fn drop_resource(&self, uuid: &str) {
        let mut snapshot = self.write();
        snapshot.resources.remove(uuid);
        snapshot.members.remove(uuid);
        for collections in snapshot.members.values_mut() {
            for uuids in collections.values_mut() {
                uuids.retain(|member| member != uuid);
            }
        }
    }

    pub fn set_members<S: AsRef<str>>(&self, parent: &str, collection: &str, uuids: &[S]) {
        self.write()
            .members
            .entry(parent.to_string())
            .or_default()
            .insert(
                collection.to_string(),
                uuids.iter().map(|u| u.as_ref().to_string()).collect(),
            );
    }

    /// Simulates losing (or regaining) the connection to the agent.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> AgentResult<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AgentError::Unreachable(self.id.clone()))
        }
    }
}

#[async_trait]
impl AgentClient for SnapshotAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, request: &FetchRequest) -> AgentResult<Value> {
        self.check_reachable()?;
        trace!(agent = %self.id, %request, "Fetch");
        self.read()
            .resources
            .get(&request.uuid)
            .cloned()
            .ok_or_else(|| AgentError::protocol(format!("unknown resource {}", request.uuid)))
    }

    async fn list_members(&self, parent: &str, collection: &str) -> AgentResult<Vec<String>> {
        self.check_reachable()?;
        let snapshot = self.read();
        if !parent.is_empty() && !snapshot.resources.contains_key(parent) {
            return Err(AgentError::protocol(format!("unknown parent {parent}")));
        }
        Ok(snapshot
            .members
            .get(parent)
            .and_then(|collections| collections.get(collection))
            .cloned()
            .unwrap_or_default())
    }
}
