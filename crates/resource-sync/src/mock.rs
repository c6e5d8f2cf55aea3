//! # Mock Agent & Testing Guide
//!
//! [`MockAgent`] implements [`AgentClient`] entirely in memory. Tests describe what the
//! agent "holds" with a fluent expectation API and the engine talks to it exactly as it
//! would to a real agent connection. [`RecordingPublisher`] captures published event
//! batches so tests can assert on them.
//!
//! ## When to use what
//!
//! | Feature | MockAgent | Real agent |
//! |---------|-----------|------------|
//! | **Speed** | Instant (in-memory) | Network round trips |
//! | **Determinism** | 100% deterministic | Depends on hardware |
//! | **Error injection** | Easy (`return_err`) | Requires pulling cables |
//!
//! ## Example
//!
//! ```rust
//! use resource_sync::error::AgentError;
//! use resource_sync::mock::MockAgent;
//! use resource_sync::agent::{AgentClient, FetchRequest};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let agent = MockAgent::new("agent-1");
//!     agent.expect_fetch("sys-1").return_ok(json!({ "status": { "health": "OK" } }));
//!     agent
//!         .expect_members("sys-1", "Processors")
//!         .return_err(AgentError::Unreachable("agent-1".into()));
//!
//!     let value = agent.fetch(&FetchRequest::new("getSystemInfo", "sys-1")).await.unwrap();
//!     assert_eq!(value["status"]["health"], "OK");
//!
//!     let listed = agent.list_members("sys-1", "Processors").await;
//!     assert!(matches!(listed, Err(AgentError::Unreachable(_))));
//!
//!     agent.verify();
//! }
//! ```
//!
//! Expectations are persistent: a fetch expectation answers every fetch of that uuid until
//! it is replaced by another `expect_fetch` for the same uuid or dropped with
//! [`MockAgent::forget_fetch`]. Requests without an expectation fail with a protocol error.

use crate::agent::{AgentClient, FetchRequest};
use crate::error::{AgentError, AgentResult};
use crate::event::{Event, EventPublisher};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

// =============================================================================
// MOCK AGENT
// =============================================================================

/// A request received by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRequest {
    Fetch(FetchRequest),
    ListMembers { parent: String, collection: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Fetch(String),
    Members(String, String),
}

#[derive(Default)]
struct MockState {
    fetches: HashMap<String, AgentResult<Value>>,
    members: HashMap<(String, String), AgentResult<Vec<String>>>,
    requests: Vec<MockRequest>,
    expected: HashSet<Key>,
    hit: HashSet<Key>,
}

type SharedState = Arc<Mutex<MockState>>;

fn lock(state: &SharedState) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct MockAgent {
    id: String,
    state: SharedState,
}

impl MockAgent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Expects a fetch of `uuid`.
    pub fn expect_fetch(&self, uuid: &str) -> FetchExpectationBuilder {
        FetchExpectationBuilder {
            uuid: uuid.to_string(),
            state: self.state.clone(),
        }
    }

    /// Expects a member listing of `collection` under `parent`.
    pub fn expect_members(&self, parent: &str, collection: &str) -> MembersExpectationBuilder {
        MembersExpectationBuilder {
            parent: parent.to_string(),
            collection: collection.to_string(),
            state: self.state.clone(),
        }
    }

    /// Drops the fetch expectation of `uuid`; later fetches fail with a protocol error.
    pub fn forget_fetch(&self, uuid: &str) {
        let mut state = lock(&self.state);
        state.fetches.remove(uuid);
        state.expected.remove(&Key::Fetch(uuid.to_string()));
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        lock(&self.state).requests.clone()
    }

    pub fn fetch_count(&self, uuid: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| matches!(r, MockRequest::Fetch(f) if f.uuid == uuid))
            .count()
    }

    /// Panics if an expectation was never exercised.
    pub fn verify(&self) {
        let state = lock(&self.state);
        let missed: Vec<&Key> = state.expected.difference(&state.hit).collect();
        if !missed.is_empty() {
            panic!("Not all expectations were met: {:?}", missed);
        }
    }
}

#[async_trait]
impl AgentClient for MockAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(&self, request: &FetchRequest) -> AgentResult<Value> {
        let mut state = lock(&self.state);
        state.requests.push(MockRequest::Fetch(request.clone()));
        let response = state.fetches.get(&request.uuid).cloned();
        match response {
            Some(response) => {
                state.hit.insert(Key::Fetch(request.uuid.clone()));
                response
            }
            None => Err(AgentError::protocol(format!("unexpected request {request}"))),
        }
    }

    async fn list_members(&self, parent: &str, collection: &str) -> AgentResult<Vec<String>> {
        let mut state = lock(&self.state);
        state.requests.push(MockRequest::ListMembers {
            parent: parent.to_string(),
            collection: collection.to_string(),
        });
        let key = (parent.to_string(), collection.to_string());
        let response = state.members.get(&key).cloned();
        match response {
            Some(response) => {
                state.hit.insert(Key::Members(key.0, key.1));
                response
            }
            None => Err(AgentError::protocol(format!(
                "unexpected listing {collection} of {parent:?}"
            ))),
        }
    }
}

/// Builder for fetch expectations.
pub struct FetchExpectationBuilder {
    uuid: String,
    state: SharedState,
}

impl FetchExpectationBuilder {
    /// Answers with `value`, the agent's JSON representation of the resource.
    pub fn return_ok(self, value: Value) {
        self.set(Ok(value));
    }

    pub fn return_err(self, error: AgentError) {
        self.set(Err(error));
    }

    fn set(self, response: AgentResult<Value>) {
        let mut state = lock(&self.state);
        state.expected.insert(Key::Fetch(self.uuid.clone()));
        state.fetches.insert(self.uuid, response);
    }
}

/// Builder for member listing expectations.
pub struct MembersExpectationBuilder {
    parent: String,
    collection: String,
    state: SharedState,
}

impl MembersExpectationBuilder {
    pub fn return_ok<S: AsRef<str>>(self, uuids: &[S]) {
        let uuids = uuids.iter().map(|s| s.as_ref().to_string()).collect();
        self.set(Ok(uuids));
    }

    pub fn return_err(self, error: AgentError) {
        self.set(Err(error));
    }

    fn set(self, response: AgentResult<Vec<String>>) {
        let mut state = lock(&self.state);
        state
            .expected
            .insert(Key::Members(self.parent.clone(), self.collection.clone()));
        state.members.insert((self.parent, self.collection), response);
    }
}

// =============================================================================
// RECORDING PUBLISHER
// =============================================================================

/// Publisher that keeps every batch it receives.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    batches: Mutex<Vec<Vec<Event>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<Vec<Event>>> {
        self.batches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn batches(&self) -> Vec<Vec<Event>> {
        self.guard().clone()
    }

    /// All published events, flattened in publication order.
    pub fn events(&self) -> Vec<Event> {
        self.guard().iter().flatten().cloned().collect()
    }

    pub fn clear(&self) {
        self.guard().clear();
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, events: Vec<Event>) {
        self.guard().push(events);
    }
}
