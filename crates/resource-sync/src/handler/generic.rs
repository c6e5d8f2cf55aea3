//! # Generic Handler
//!
//! The one [`Handler`] implementation. It owns the [`ResourceStore`] and [`IdPolicy`] of a
//! single resource kind and drives fetch, descent, sweep and cascade for it.
//!
//! # Architecture Note
//! The handler has no static schema. It learns which kinds sit below it the first time it
//! delegates to them (`sub_components`) and never forgets; cascading delete and visitor
//! descent consult that set.

use super::{Handler, Notification, NotificationKind};
use crate::agent::AgentHandle;
use crate::association::AssociationTable;
use crate::context::{Context, Mode};
use crate::error::{SyncError, SyncResult};
use crate::event::EventType;
use crate::id_policy::IdPolicy;
use crate::locator::ResourceRef;
use crate::model::{CollectionType, Component, Health, ResourceModel};
use crate::registry::HandlerRegistry;
use crate::store::{ResourceStore, UpdateStatus};
use crate::visitor::{ResourceVisitor, Traversal};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock, RwLock, Weak};
use tracing::{debug, error, info, warn};

/// A weak many-to-many relation reconciled after the owner is fetched recursively.
#[derive(Debug, Clone)]
pub struct AssociationLink {
    /// Collection name listed at the agent under the owner.
    pub collection: String,
    pub table: Arc<AssociationTable>,
}

/// Handler for resources of type `M`.
pub struct GenericHandler<M: ResourceModel> {
    store: ResourceStore<M>,
    id_policy: IdPolicy,
    sub_components: RwLock<BTreeSet<Component>>,
    pub(super) associations: Vec<AssociationLink>,
    registry: OnceLock<Weak<HandlerRegistry>>,
}

impl<M: ResourceModel> Default for GenericHandler<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ResourceModel> GenericHandler<M> {
    pub fn new() -> Self {
        Self {
            store: ResourceStore::new(),
            id_policy: IdPolicy::new(M::NUMBERING),
            sub_components: RwLock::new(BTreeSet::new()),
            associations: Vec::new(),
            registry: OnceLock::new(),
        }
    }

    /// Reconciles `table` from the `collection` listed under every fetched owner.
    pub fn with_association(mut self, collection: impl Into<String>, table: Arc<AssociationTable>) -> Self {
        self.associations.push(AssociationLink {
            collection: collection.into(),
            table,
        });
        self
    }

    pub fn store(&self) -> &ResourceStore<M> {
        &self.store
    }

    pub fn id_policy(&self) -> &IdPolicy {
        &self.id_policy
    }

    pub fn get(&self, uuid: &str) -> Option<M> {
        self.store.get(uuid)
    }

    /// Records `component` as a child kind. Normally learned during descent.
    pub fn remember_sub_component(&self, component: Component) {
        let mut subs = self
            .sub_components
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if subs.insert(component) {
            debug!(component = %M::COMPONENT, sub_component = %component, "Learned sub-component");
        }
    }

    pub(crate) fn registry(&self) -> SyncResult<Arc<HandlerRegistry>> {
        self.registry
            .get()
            .and_then(Weak::upgrade)
            .ok_or(SyncError::RegistryDropped)
    }

    pub(crate) fn agent_of(ctx: &Context) -> SyncResult<AgentHandle> {
        ctx.agent()
            .cloned()
            .ok_or_else(|| SyncError::UnknownAgent(format!("no agent bound in {} context", ctx.mode)))
    }

    /// Reads `uuid` from the agent and upserts it, recording the matching events.
    pub(crate) async fn fetch(
        &self,
        ctx: &mut Context,
        parent: &str,
        uuid: &str,
    ) -> SyncResult<(M, UpdateStatus)> {
        let agent = Self::agent_of(ctx)?;
        let request = M::fetch_request(uuid);
        debug!(mode = %ctx.mode, depth = ctx.depth(), %request, "Fetching");

        let value = agent.fetch(&request).await?;
        let mut resource: M = serde_json::from_value(value)?;
        {
            let header = resource.header_mut();
            header.uuid = uuid.to_string();
            header.parent_uuid = parent.to_string();
            header.agent_id = agent.id().to_string();
            if ctx.mode.stamps_parent_type() {
                header.parent_type = ctx.parent_type();
            }
            header.id = self.id_policy.id_for(uuid, parent);
        }

        let status = self.store.upsert(resource.clone());
        let component = M::COMPONENT;
        match status {
            UpdateStatus::Added => {
                ctx.counters.added += 1;
                ctx.add_event(EventType::ResourceAdded, component, uuid);
                ctx.mark_added();
                info!(mode = %ctx.mode, %component, %uuid, id = resource.header().id, "Added");
            }
            UpdateStatus::StatusChanged => {
                ctx.counters.updated += 1;
                ctx.counters.status_changed += 1;
                ctx.add_event(EventType::ResourceUpdated, component, uuid);
                if resource.header().status.health == Some(Health::WORST) {
                    ctx.counters.alerts += 1;
                    ctx.add_event(EventType::Alert, component, uuid);
                    warn!(%component, %uuid, "Resource health critical");
                }
                info!(mode = %ctx.mode, %component, %uuid, status = ?resource.header().status, "Status changed");
            }
            UpdateStatus::Updated => {
                ctx.counters.updated += 1;
                ctx.add_event(EventType::ResourceUpdated, component, uuid);
                debug!(mode = %ctx.mode, %component, %uuid, "Updated");
            }
            UpdateStatus::NoUpdate => {}
        }
        Ok((resource, status))
    }

    /// Fetches `uuid` and, when `recursively`, its whole declared subtree.
    pub(crate) async fn add(
        &self,
        ctx: &mut Context,
        parent: &str,
        uuid: &str,
        recursively: bool,
    ) -> SyncResult<u64> {
        let (resource, _) = self.fetch(ctx, parent, uuid).await?;
        if recursively {
            self.fetch_subcomponents(ctx, uuid, &resource.header().collections)
                .await?;
            self.fetch_associations(ctx, uuid).await?;
        }
        Ok(resource.header().id)
    }

    async fn handle_add(&self, ctx: &mut Context, n: &Notification) -> SyncResult<bool> {
        if self.store.contains(&n.uuid) {
            info!(component = %M::COMPONENT, uuid = %n.uuid, "Already present, ignoring add");
            return Ok(true);
        }
        match self.add(ctx, &n.parent, &n.uuid, true).await {
            Ok(id) => {
                debug!(component = %M::COMPONENT, uuid = %n.uuid, id, "Add handled");
                Ok(true)
            }
            Err(e) if e.is_unreachable() => {
                error!(component = %M::COMPONENT, uuid = %n.uuid, error = %e, "Agent unreachable, rolling back add");
                match self.do_remove(ctx, &n.uuid) {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {}
                    Err(e) => warn!(uuid = %n.uuid, error = %e, "Rollback incomplete"),
                }
                ctx.take_events();
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn handle_remove(&self, ctx: &mut Context, n: &Notification) -> SyncResult<bool> {
        match self.do_remove(ctx, &n.uuid) {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => {
                info!(component = %M::COMPONENT, uuid = %n.uuid, "Already removed");
                Ok(true)
            }
            Err(e) => Err(e),
        }
    }

    async fn handle_update(&self, ctx: &mut Context, n: &Notification) -> SyncResult<bool> {
        if !self.store.contains(&n.uuid) {
            info!(component = %M::COMPONENT, uuid = %n.uuid, "Unknown resource, nothing to update");
            return Ok(true);
        }
        self.add(ctx, &n.parent, &n.uuid, false).await?;
        Ok(true)
    }
}

#[async_trait]
impl<M: ResourceModel> Handler for GenericHandler<M> {
    fn component(&self) -> Component {
        M::COMPONENT
    }

    fn bind(&self, registry: Weak<HandlerRegistry>) {
        if self.registry.set(registry).is_err() {
            warn!(component = %M::COMPONENT, "Handler already bound to a registry");
        }
    }

    fn store_epoch(&self) -> u64 {
        self.store.current_epoch()
    }

    fn contains(&self, uuid: &str) -> bool {
        self.store.contains(uuid)
    }

    fn describe(&self, uuid: &str) -> Option<ResourceRef> {
        self.store.with_entry(uuid, |m| {
            let header = m.header();
            ResourceRef {
                component: M::COMPONENT,
                uuid: header.uuid.clone(),
                id: header.id,
                parent_uuid: header.parent_uuid.clone(),
                parent_type: header.parent_type,
                agent_id: header.agent_id.clone(),
            }
        })
    }

    fn keys(&self, parent: &str) -> Vec<String> {
        self.store.keys(parent)
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn sub_components(&self) -> Vec<Component> {
        self.sub_components
            .read()
            .map(|subs| subs.iter().copied().collect())
            .unwrap_or_default()
    }

    async fn handle(&self, agent: AgentHandle, notification: &Notification) -> bool {
        if notification.component != M::COMPONENT {
            error!(
                component = %M::COMPONENT,
                received = %notification.component,
                "Notification routed to the wrong handler"
            );
            return false;
        }
        let registry = match self.registry() {
            Ok(registry) => registry,
            Err(e) => {
                error!(error = %e, "Cannot handle notification");
                return false;
            }
        };

        let mut ctx = Context::new(Mode::Event, Some(agent), registry.clone());
        ctx.push(registry.find_component(&notification.parent));
        debug!(
            component = %M::COMPONENT,
            kind = %notification.kind,
            uuid = %notification.uuid,
            parent = %notification.parent,
            "Handling notification"
        );

        let result = match &notification.kind {
            NotificationKind::Add => self.handle_add(&mut ctx, notification).await,
            NotificationKind::Remove => self.handle_remove(&mut ctx, notification),
            NotificationKind::Update => self.handle_update(&mut ctx, notification).await,
            NotificationKind::Unknown(kind) => {
                error!(component = %M::COMPONENT, %kind, "Unknown notification kind");
                return false;
            }
        };
        ctx.pop();

        match result {
            Ok(true) => {
                ctx.publish();
                true
            }
            Ok(false) => false,
            Err(e) => {
                error!(
                    component = %M::COMPONENT,
                    uuid = %notification.uuid,
                    error = %e,
                    "Notification failed, state may be incomplete"
                );
                false
            }
        }
    }

    async fn poll(&self, agent: AgentHandle, parent: &str, parent_type: Component, uuid: &str) {
        let registry = match self.registry() {
            Ok(registry) => registry,
            Err(e) => {
                error!(error = %e, "Cannot poll");
                return;
            }
        };
        let mut ctx = Context::new(Mode::Polling, Some(agent), registry);
        ctx.push(parent_type);
        match self.add(&mut ctx, parent, uuid, true).await {
            Ok(_) => {}
            Err(e) if e.is_unreachable() => {
                error!(component = %M::COMPONENT, %uuid, error = %e, "Agent unreachable, poll aborted");
            }
            Err(e) if e.is_protocol() => {
                debug!(component = %M::COMPONENT, %uuid, error = %e, "Protocol error during poll");
            }
            Err(e) => {
                warn!(component = %M::COMPONENT, %uuid, error = %e, "Poll failed, state may be incomplete");
            }
        }
        ctx.pop();
        ctx.publish();
        info!(
            component = %M::COMPONENT,
            %uuid,
            added = ctx.counters.added,
            removed = ctx.counters.removed,
            updated = ctx.counters.updated,
            status_changed = ctx.counters.status_changed,
            "Poll finished"
        );
    }

    async fn load(
        &self,
        agent: AgentHandle,
        parent: &str,
        parent_type: Component,
        uuid: &str,
        recursively: bool,
    ) -> SyncResult<u64> {
        let mut ctx = Context::new(Mode::Loading, Some(agent), self.registry()?);
        ctx.push(parent_type);
        let result = self.do_load(&mut ctx, parent, uuid, recursively).await;
        ctx.pop();
        if result.is_ok() {
            ctx.publish();
        }
        result
    }

    async fn load_collection(
        &self,
        agent: AgentHandle,
        parent: &str,
        parent_type: Component,
        collection_type: CollectionType,
        recursively: bool,
    ) -> SyncResult<()> {
        let mut ctx = Context::new(Mode::Loading, Some(agent), self.registry()?);
        ctx.push(parent_type);
        let result = self
            .reload_collection(&mut ctx, parent, collection_type, recursively)
            .await;
        ctx.pop();
        if result.is_ok() {
            ctx.publish();
        }
        result
    }

    fn remove(&self, uuid: &str) -> bool {
        let registry = match self.registry() {
            Ok(registry) => registry,
            Err(e) => {
                error!(error = %e, "Cannot remove");
                return false;
            }
        };
        let mut ctx = Context::new(Mode::UserAction, None, registry);
        let removed = match self.do_remove(&mut ctx, uuid) {
            Ok(()) => true,
            Err(e) if e.is_not_found() => {
                info!(component = %M::COMPONENT, %uuid, "Nothing to remove");
                false
            }
            Err(e) => {
                error!(component = %M::COMPONENT, %uuid, error = %e, "Remove failed, state may be incomplete");
                false
            }
        };
        ctx.publish();
        removed
    }

    fn accept(&self, visitor: &mut dyn ResourceVisitor, uuid: &str) -> bool {
        let mut traversal = Traversal::new(visitor);
        self.do_accept(&mut traversal, uuid)
    }

    async fn do_load(
        &self,
        ctx: &mut Context,
        parent: &str,
        uuid: &str,
        recursively: bool,
    ) -> SyncResult<u64> {
        self.add(ctx, parent, uuid, recursively).await
    }

    async fn update(&self, ctx: &mut Context, parent: &str, uuid: &str) -> SyncResult<u64> {
        self.add(ctx, parent, uuid, false).await
    }

    async fn fetch_siblings(
        &self,
        ctx: &mut Context,
        parent: &str,
        collection_name: &str,
    ) -> SyncResult<()> {
        let uuids = self
            .fetch_sibling_uuid_list(ctx, parent, collection_name)
            .await?;
        for uuid in uuids {
            if let Err(e) = self.add(ctx, parent, &uuid, true).await {
                if e.is_unreachable() {
                    return Err(e);
                }
                warn!(component = %M::COMPONENT, %uuid, %parent, error = %e, "Skipping sibling");
            }
        }
        Ok(())
    }

    async fn fetch_sibling_uuid_list(
        &self,
        ctx: &mut Context,
        parent: &str,
        collection_name: &str,
    ) -> SyncResult<Vec<String>> {
        self.list_members(ctx, parent, collection_name).await
    }

    async fn fetch_parent_children(
        &self,
        ctx: &mut Context,
        parent: &str,
        collection_name: &str,
        table: &AssociationTable,
    ) -> SyncResult<()> {
        self.reconcile_association(ctx, parent, collection_name, table)
            .await
    }

    fn do_remove(&self, ctx: &mut Context, uuid: &str) -> SyncResult<()> {
        self.cascade_remove(ctx, uuid)
    }

    fn remove_all(&self, ctx: &mut Context, parent: &str) {
        for uuid in self.store.keys(parent) {
            if let Err(e) = self.do_remove(ctx, &uuid) {
                debug!(component = %M::COMPONENT, %uuid, error = %e, "Child already gone");
            }
        }
    }

    fn remove_untouched(&self, ctx: &mut Context, parent: &str, epoch: u64) {
        self.sweep(ctx, parent, epoch);
    }

    fn remove_agent_data(&self, ctx: &mut Context, agent_id: &str) {
        let owned = self
            .store
            .keys_where(|m, _| m.header().agent_id == agent_id);
        if !owned.is_empty() {
            info!(component = %M::COMPONENT, %agent_id, count = owned.len(), "Removing agent data");
        }
        for uuid in owned {
            if let Err(e) = self.do_remove(ctx, &uuid) {
                debug!(component = %M::COMPONENT, %uuid, error = %e, "Already removed by cascade");
            }
        }
    }

    fn release_ids(&self, parent: &str) {
        if self.id_policy.release_parent(parent) {
            debug!(component = %M::COMPONENT, %parent, "Released id counter");
        }
    }

    fn do_accept(&self, traversal: &mut Traversal<'_>, uuid: &str) -> bool {
        if traversal.is_visited(uuid) {
            return true;
        }
        let Some(keep_going) = self
            .store
            .with_entry(uuid, |m| traversal.visit(m, M::COMPONENT))
        else {
            debug!(component = %M::COMPONENT, %uuid, "Visited resource not in store");
            return true;
        };
        if !keep_going {
            return false;
        }
        traversal.mark_visited(uuid);

        let registry = match self.registry() {
            Ok(registry) => registry,
            Err(_) => return true,
        };
        for component in self.sub_components() {
            let Ok(handler) = registry.handler_for(component) else {
                continue;
            };
            if !handler.do_accept_recursively(traversal, uuid, M::COMPONENT) {
                return false;
            }
        }
        true
    }

    fn do_accept_recursively(
        &self,
        traversal: &mut Traversal<'_>,
        parent: &str,
        parent_type: Component,
    ) -> bool {
        for uuid in self.store.keys(parent) {
            if !self.do_accept(traversal, &uuid) {
                debug!(component = %M::COMPONENT, %parent, %parent_type, "Traversal stopped");
                return false;
            }
        }
        true
    }
}
