//! Recursive descent into declared collections and weak associations.

use super::{GenericHandler, Handler};
use crate::association::{diff, AssociationTable};
use crate::context::Context;
use crate::error::{AgentError, SyncResult};
use crate::model::{Collection, CollectionType, ResourceModel};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Epoch captured per distinct sub-handler before its collections are fetched.
#[derive(Default)]
struct Floors(Vec<(Arc<dyn Handler>, u64)>);

impl Floors {
    /// Keeps the lowest epoch when several collections map to one kind.
    fn capture(&mut self, handler: &Arc<dyn Handler>) {
        let epoch = handler.store_epoch();
        match self
            .0
            .iter_mut()
            .find(|(h, _)| h.component() == handler.component())
        {
            Some((_, floor)) => *floor = (*floor).min(epoch),
            None => self.0.push((handler.clone(), epoch)),
        }
    }

    fn sweep(self, ctx: &mut Context, parent: &str) {
        for (handler, epoch) in self.0 {
            handler.remove_untouched(ctx, parent, epoch);
        }
    }
}

impl<M: ResourceModel> GenericHandler<M> {
    /// Adds the members of every collection of `parent`, then sweeps what was not seen.
    pub(crate) async fn fetch_subcomponents(
        &self,
        ctx: &mut Context,
        parent: &str,
        collections: &[Collection],
    ) -> SyncResult<()> {
        let handlers = ctx.registry().handlers_for(collections);
        ctx.push(M::COMPONENT);
        let result = self.descend(ctx, parent, handlers).await;
        ctx.pop();
        result
    }

    async fn descend(
        &self,
        ctx: &mut Context,
        parent: &str,
        handlers: Vec<(String, Arc<dyn Handler>)>,
    ) -> SyncResult<()> {
        let mut floors = Floors::default();
        for (name, handler) in &handlers {
            floors.capture(handler);
            self.remember_sub_component(handler.component());
            if let Err(e) = handler.fetch_siblings(ctx, parent, name).await {
                if e.is_unreachable() {
                    return Err(e);
                }
                warn!(
                    component = %M::COMPONENT,
                    %parent,
                    collection = %name,
                    error = %e,
                    "Collection fetch failed"
                );
            }
        }
        floors.sweep(ctx, parent);
        Ok(())
    }

    /// Reconciles every configured weak association of `owner`.
    pub(crate) async fn fetch_associations(&self, ctx: &mut Context, owner: &str) -> SyncResult<()> {
        for link in &self.associations {
            if let Err(e) = self
                .fetch_parent_children(ctx, owner, &link.collection, &link.table)
                .await
            {
                if e.is_unreachable() {
                    return Err(e);
                }
                warn!(%owner, collection = %link.collection, error = %e, "Association fetch failed");
            }
        }
        Ok(())
    }

    /// Lists members at the agent. A protocol error yields an empty list.
    pub(crate) async fn list_members(
        &self,
        ctx: &mut Context,
        parent: &str,
        collection_name: &str,
    ) -> SyncResult<Vec<String>> {
        let agent = Self::agent_of(ctx)?;
        match agent.list_members(parent, collection_name).await {
            Ok(uuids) => {
                debug!(%parent, collection = %collection_name, count = uuids.len(), "Listed members");
                Ok(uuids)
            }
            Err(e @ AgentError::Protocol { .. }) => {
                warn!(%parent, collection = %collection_name, error = %e, "Member list unavailable");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) async fn reconcile_association(
        &self,
        ctx: &mut Context,
        owner: &str,
        collection_name: &str,
        table: &AssociationTable,
    ) -> SyncResult<()> {
        let fetched = self.list_members(ctx, owner, collection_name).await?;
        let agent_id = ctx.agent_id().unwrap_or_default().to_string();
        let changes = diff(&fetched, &table.members(owner));
        table.apply(owner, &agent_id, &changes);
        debug!(
            table = %table.name(),
            %owner,
            added = changes.to_add.len(),
            removed = changes.to_remove.len(),
            "Association reconciled"
        );
        Ok(())
    }

    /// Re-reads `parent` for its current collections of `collection_type` and reloads them.
    pub(crate) async fn reload_collection(
        &self,
        ctx: &mut Context,
        parent: &str,
        collection_type: CollectionType,
        recursively: bool,
    ) -> SyncResult<()> {
        let agent = Self::agent_of(ctx)?;
        let value = agent.fetch(&M::fetch_request(parent)).await?;
        let resource: M = serde_json::from_value(value)?;
        let collections: Vec<Collection> = resource
            .header()
            .collections
            .iter()
            .filter(|c| c.collection_type == collection_type)
            .cloned()
            .collect();
        if collections.is_empty() {
            error!(component = %M::COMPONENT, %parent, %collection_type, "No collection of this type");
        }

        if recursively {
            return self.fetch_subcomponents(ctx, parent, &collections).await;
        }

        let handlers = ctx.registry().handlers_for(&collections);
        ctx.push(M::COMPONENT);
        let result = self.update_members(ctx, parent, handlers).await;
        ctx.pop();
        result
    }

    async fn update_members(
        &self,
        ctx: &mut Context,
        parent: &str,
        handlers: Vec<(String, Arc<dyn Handler>)>,
    ) -> SyncResult<()> {
        let mut floors = Floors::default();
        for (name, handler) in &handlers {
            floors.capture(handler);
            self.remember_sub_component(handler.component());
            let uuids = handler.fetch_sibling_uuid_list(ctx, parent, name).await?;
            for uuid in uuids {
                handler.update(ctx, parent, &uuid).await?;
            }
        }
        floors.sweep(ctx, parent);
        Ok(())
    }
}
