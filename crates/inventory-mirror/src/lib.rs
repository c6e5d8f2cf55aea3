//! # Inventory Mirror
//!
//! The hardware inventory built on [`resource_sync`]: concrete resource kinds, the handler
//! wiring for them and the lifecycle of a running mirror.
//!
//! - **[model]**: data structures for managers, systems, switches, storage and fabrics.
//! - **[handlers]**: `<Kind>Handler` aliases and registry assembly.
//! - **[agent]**: [`SnapshotAgent`](agent::SnapshotAgent), an in-memory agent for demos and tests.
//! - **[lifecycle]**: [`MirrorSystem`](lifecycle::MirrorSystem), start to shutdown.

pub mod agent;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod model;

pub use error::MirrorError;
