//! # Sync Errors
//!
//! This module defines the error types used throughout the sync engine. Two layers exist:
//!
//! - [`AgentError`] is what an [`AgentClient`](crate::agent::AgentClient) returns. It is the
//!   small, fixed set of failure kinds the RPC boundary can produce.
//! - [`SyncError`] is what engine operations return. Agent failures are carried unchanged
//!   inside [`SyncError::Agent`] so that entry points can classify them.
//!
//! ## Classification
//!
//! | Kind | Effect on the current pass |
//! |------|----------------------------|
//! | `AgentError::Unreachable` | Aborts the whole pass. An `Add` event rolls back. |
//! | `AgentError::Protocol` | Empty result when listing members, otherwise aborts the branch. |
//! | `SyncError::NotFound` | Benign. Logged at info level and reported as success. |

use crate::model::Component;

/// Failures surfaced by the agent RPC boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    #[error("Agent {0} unreachable")]
    Unreachable(String),
    #[error("Protocol error ({code}): {message}")]
    Protocol { code: i32, message: String },
    #[error("Agent call failed: {0}")]
    Other(String),
}

impl AgentError {
    /// Shorthand for a protocol error with a generic code.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            code: -32600,
            message: message.into(),
        }
    }
}

/// Result of a raw agent call.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors produced by the sync engine itself.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("No handler defined for {0}")]
    HandlerNotDefined(String),
    #[error("Handler registry has been dropped")]
    RegistryDropped,
    #[error("Invalid value for {component} {uuid}: {reason}")]
    InvalidValue {
        component: Component,
        uuid: String,
        reason: String,
    },
    #[error("Malformed agent response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// True when the agent connection is lost and the current pass must stop.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, SyncError::Agent(AgentError::Unreachable(_)))
    }

    /// True for malformed or incompatible agent responses.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            SyncError::Agent(AgentError::Protocol { .. }) | SyncError::Decode(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound(_))
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(e: toml::de::Error) -> Self {
        SyncError::Config(e.to_string())
    }
}

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_agent_failures() {
        let unreachable: SyncError = AgentError::Unreachable("agent-1".into()).into();
        assert!(unreachable.is_unreachable());
        assert!(!unreachable.is_protocol());

        let protocol: SyncError = AgentError::protocol("bad payload").into();
        assert!(protocol.is_protocol());
        assert!(!protocol.is_unreachable());

        let decode: SyncError = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
        assert!(decode.is_protocol());

        assert!(SyncError::NotFound("x".into()).is_not_found());
    }
}
