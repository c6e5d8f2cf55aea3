//! # Agent Boundary
//!
//! The remote management agent is the source of truth. The engine consumes it through the
//! [`AgentClient`] trait, which is the "client" half of the RPC boundary: the transport and
//! envelope live behind the implementation, the engine only sees JSON values and typed errors.

use crate::error::AgentResult;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A kind-specific request for a single resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchRequest {
    pub command: String,
    pub uuid: String,
}

impl FetchRequest {
    pub fn new(command: impl Into<String>, uuid: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            uuid: uuid.into(),
        }
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.command, self.uuid)
    }
}

/// RPC interface to one remote agent.
///
/// Implementations must surface connectivity loss as
/// [`AgentError::Unreachable`](crate::error::AgentError::Unreachable); it is the only
/// cancellation signal the engine recognizes.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Stable identifier of the agent. Stamped on every resource it owns.
    fn id(&self) -> &str;

    /// Reads one resource.
    async fn fetch(&self, request: &FetchRequest) -> AgentResult<Value>;

    /// Lists member uuids of the named collection of `parent`.
    ///
    /// An empty `parent` addresses the agent root.
    async fn list_members(&self, parent: &str, collection: &str) -> AgentResult<Vec<String>>;
}

/// Shared handle to an agent connection.
pub type AgentHandle = Arc<dyn AgentClient>;
