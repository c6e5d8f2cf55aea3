//! # Per-Agent Transactions
//!
//! An agent RPC call and the local reconciliation it implies must not interleave with
//! another operation against the same agent. [`TransactionManager::run`] serializes named
//! units of work per agent id with a `tokio::sync::Mutex`; work against different agents
//! proceeds in parallel.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, info_span, Instrument};

#[derive(Debug, Default)]
pub struct TransactionManager {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl TransactionManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, agent_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks
            .entry(agent_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Runs `work` while holding the transaction lock of `agent_id`.
    pub async fn run<F, T>(&self, agent_id: &str, name: &str, work: F) -> T
    where
        F: Future<Output = T>,
    {
        let lock = self.lock_for(agent_id);
        let span = info_span!("transaction", agent = %agent_id, name = %name);
        async move {
            let _guard = lock.lock().await;
            debug!("Transaction started");
            let result = work.await;
            debug!("Transaction finished");
            result
        }
        .instrument(span)
        .await
    }

    /// Drops the lock of a retired agent.
    ///
    /// A lock still held or awaited elsewhere is kept, so an agent attached again under the
    /// same id queues behind that work instead of getting a fresh lock.
    pub fn forget(&self, agent_id: &str) {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match locks.get(agent_id) {
            Some(lock) if Arc::strong_count(lock) == 1 => {
                locks.remove(agent_id);
            }
            Some(_) => debug!(agent = %agent_id, "Transaction lock still in use, kept"),
            None => {}
        }
    }
}
