//! # Resource Handlers
//!
//! A [`Handler`] owns the mirrored resources of one kind and implements every
//! synchronization operation on them. The engine has exactly one implementation,
//! [`GenericHandler<M>`], parameterized by a [`ResourceModel`](crate::model::ResourceModel);
//! the trait exists so the [`HandlerRegistry`] can hold all kinds behind `Arc<dyn Handler>`
//! and so handlers can delegate to each other without knowing concrete types.
//!
//! ## Entry Points vs Building Blocks
//!
//! Methods taking an [`AgentHandle`] are **entry points**: they create their own
//! [`Context`], catch and log errors, and publish events. Methods taking `&mut Context`
//! are **building blocks** called while another operation is in progress; they propagate
//! errors and leave publishing to the entry point.
//!
//! | Entry point | Mode | Building blocks used |
//! |-------------|------|----------------------|
//! | `handle` | Event | add / remove / update |
//! | `poll` | Polling | add (recursive) |
//! | `load` / `load_collection` | Loading | do_load / update |
//! | `remove` | UserAction | do_remove |
//!
//! ## Recursion
//!
//! `add` on one handler calls `fetch_siblings` on the handlers of its declared collections,
//! which call `add` again. Because those calls go through `dyn Handler`, every level of the
//! descent is a boxed future and the recursion depth is bounded only by the resource tree.

mod descent;
mod generic;
mod sweep;

pub use generic::{AssociationLink, GenericHandler};

use crate::agent::AgentHandle;
use crate::association::AssociationTable;
use crate::context::Context;
use crate::error::SyncResult;
use crate::locator::ResourceRef;
use crate::model::{CollectionType, Component};
use crate::registry::HandlerRegistry;
use crate::visitor::{ResourceVisitor, Traversal};
use async_trait::async_trait;
use std::fmt;
use std::sync::Weak;

/// What an agent reports about one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationKind {
    Add,
    Remove,
    Update,
    Unknown(String),
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Add => f.write_str("Add"),
            NotificationKind::Remove => f.write_str("Remove"),
            NotificationKind::Update => f.write_str("Update"),
            NotificationKind::Unknown(kind) => write!(f, "Unknown({kind})"),
        }
    }
}

/// An asynchronous agent notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub component: Component,
    pub kind: NotificationKind,
    pub parent: String,
    pub uuid: String,
}

impl Notification {
    pub fn new(
        component: Component,
        kind: NotificationKind,
        parent: impl Into<String>,
        uuid: impl Into<String>,
    ) -> Self {
        Self {
            component,
            kind,
            parent: parent.into(),
            uuid: uuid.into(),
        }
    }
}

#[async_trait]
pub trait Handler: Send + Sync {
    fn component(&self) -> Component;

    /// Late-binds the registry this handler delegates through.
    fn bind(&self, registry: Weak<HandlerRegistry>);

    fn store_epoch(&self) -> u64;
    fn contains(&self, uuid: &str) -> bool;
    fn describe(&self, uuid: &str) -> Option<ResourceRef>;
    /// Uuids of the stored children of `parent`.
    fn keys(&self, parent: &str) -> Vec<String>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Kinds this handler has delegated to as children so far.
    fn sub_components(&self) -> Vec<Component>;

    // Entry points.

    /// Applies an agent notification. Never fails: errors are logged and reported as `false`.
    async fn handle(&self, agent: AgentHandle, notification: &Notification) -> bool;

    async fn poll(&self, agent: AgentHandle, parent: &str, parent_type: Component, uuid: &str);

    async fn load(
        &self,
        agent: AgentHandle,
        parent: &str,
        parent_type: Component,
        uuid: &str,
        recursively: bool,
    ) -> SyncResult<u64>;

    /// Reloads the members of every collection of `parent` with the given kind.
    ///
    /// Called on the handler of `parent`'s kind.
    async fn load_collection(
        &self,
        agent: AgentHandle,
        parent: &str,
        parent_type: Component,
        collection_type: CollectionType,
        recursively: bool,
    ) -> SyncResult<()>;

    /// Removes `uuid` and its subtree on behalf of a user. Returns `false` when it was absent.
    fn remove(&self, uuid: &str) -> bool;

    fn accept(&self, visitor: &mut dyn ResourceVisitor, uuid: &str) -> bool;

    // Building blocks.

    async fn do_load(
        &self,
        ctx: &mut Context,
        parent: &str,
        uuid: &str,
        recursively: bool,
    ) -> SyncResult<u64>;

    async fn update(&self, ctx: &mut Context, parent: &str, uuid: &str) -> SyncResult<u64>;

    async fn fetch_siblings(
        &self,
        ctx: &mut Context,
        parent: &str,
        collection_name: &str,
    ) -> SyncResult<()>;

    async fn fetch_sibling_uuid_list(
        &self,
        ctx: &mut Context,
        parent: &str,
        collection_name: &str,
    ) -> SyncResult<Vec<String>>;

    async fn fetch_parent_children(
        &self,
        ctx: &mut Context,
        parent: &str,
        collection_name: &str,
        table: &AssociationTable,
    ) -> SyncResult<()>;

    fn do_remove(&self, ctx: &mut Context, uuid: &str) -> SyncResult<()>;
    fn remove_all(&self, ctx: &mut Context, parent: &str);
    fn remove_untouched(&self, ctx: &mut Context, parent: &str, epoch: u64);
    fn remove_agent_data(&self, ctx: &mut Context, agent_id: &str);
    /// Forgets the id counter kept for children of a removed `parent`.
    fn release_ids(&self, parent: &str);

    fn do_accept(&self, traversal: &mut Traversal<'_>, uuid: &str) -> bool;
    fn do_accept_recursively(
        &self,
        traversal: &mut Traversal<'_>,
        parent: &str,
        parent_type: Component,
    ) -> bool;
}
