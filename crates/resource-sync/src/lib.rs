//! # Resource Sync
//!
//! A generic engine that keeps a local, REST-addressable mirror of hardware inventory in
//! step with remote management agents. Agents are reachable only over RPC; the engine
//! fetches their resources, stores them per kind, follows declared child collections
//! recursively and prunes whatever the agents stopped reporting.
//!
//! ## Why a Generic Engine?
//!
//! The shape of the inventory tree is not known up front. A system reports a `Processors`
//! collection, a switch reports `Ports`, a fabric reports `Zones` and `Endpoints`. Instead
//! of hand-writing a synchronizer per kind, every kind gets the same
//! [`GenericHandler<M>`](handler::GenericHandler) and only declares its data shape through
//! [`ResourceModel`](model::ResourceModel). Handlers learn the tree as they walk it.
//!
//! ## Architecture Overview
//!
//! 1. **Data Layer** ([`store`], [`id_policy`], [`association`]) - keyed stores with epochs,
//!    REST id assignment and weak many-to-many tables
//! 2. **Sync Layer** ([`handler`], [`context`], [`registry`]) - fetch, descent, sweep,
//!    cascade and dispatch between kinds
//! 3. **Service Layer** ([`engine`], [`watcher`], [`transaction`]) - agents, polling,
//!    notifications and per-agent serialization
//!
//! ## The Sync Pass
//!
//! ```text
//! handle / poll / load
//!   └─ fetch(uuid)            upsert, touched = epoch, record events
//!       └─ for each declared collection
//!           ├─ capture sub-store epoch
//!           ├─ list members, add(member, recursive)
//!           └─ remember sub-component kind
//!       └─ remove_untouched(parent, captured epoch)   Polling / Loading only
//!   └─ publish events
//! ```
//!
//! Anything a pass did not touch is still stamped at or below the captured epoch and is
//! removed together with its subtree. Event-driven passes are narrow and never sweep.
//!
//! ## Error Policy
//!
//! An unreachable agent aborts the pass (and rolls back an `Add` notification). Protocol
//! errors degrade gracefully: an unreadable member list counts as empty. Entry points never
//! propagate agent failures to their caller; they log and return `false`.
//!
//! ## Testing
//!
//! The [`mock`] module provides [`MockAgent`](mock::MockAgent), an in-memory agent with an
//! expectation builder API, and [`RecordingPublisher`](mock::RecordingPublisher).

pub mod agent;
pub mod association;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod event;
pub mod handler;
pub mod id_policy;
pub mod locator;
pub mod mock;
pub mod model;
pub mod registry;
pub mod store;
pub mod tracing;
pub mod transaction;
pub mod visitor;
pub mod watcher;

// Re-export core types for convenience
pub use agent::{AgentClient, AgentHandle, FetchRequest};
pub use config::{AddedEventPolicy, EngineConfig};
pub use context::{Context, Mode};
pub use engine::{NotificationBatch, SyncEngine};
pub use error::{AgentError, SyncError, SyncResult};
pub use event::{Event, EventPublisher, EventType, SubscriptionHub};
pub use handler::{GenericHandler, Handler, Notification, NotificationKind};
pub use model::{Collection, CollectionType, Component, Health, ResourceHeader, ResourceModel};
pub use registry::{HandlerRegistry, RegistryBuilder};
pub use visitor::{HealthRollup, ResourceVisitor, VisitedResource};
pub use watcher::Watcher;
