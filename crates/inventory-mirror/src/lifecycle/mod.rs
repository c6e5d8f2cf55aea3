//! # System Lifecycle & Orchestration
//!
//! Wires the generic engine to the concrete inventory kinds and runs it.
//!
//! ## The MirrorSystem Pattern
//!
//! [`MirrorSystem`] is the conductor:
//!
//! 1. **Handlers** - one [`GenericHandler`](resource_sync::GenericHandler) per kind,
//!    created without knowledge of each other
//! 2. **Registry** - built last, hands every handler a weak back-reference (late binding)
//! 3. **Engine & Watcher** - the facade plus the background task that polls and applies
//!    agent notifications
//! 4. **Graceful Shutdown** - close the notification channel, stop the watcher, retire
//!    every agent so subscribers see the removals
//!
//! ## Observability
//!
//! Logging is initialized once by the binary through
//! [`setup_tracing`](resource_sync::tracing::setup_tracing):
//!
//! ```bash
//! RUST_LOG=info cargo run      # Operation summaries
//! RUST_LOG=debug cargo run     # Every fetch, listing and sweep decision
//! ```

pub mod mirror_system;

pub use mirror_system::*;
