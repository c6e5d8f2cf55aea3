//! Staleness sweep and cascading removal.

use super::{GenericHandler, Handler};
use crate::context::Context;
use crate::error::{SyncError, SyncResult};
use crate::event::EventType;
use crate::model::ResourceModel;
use tracing::{debug, error, info, warn};

impl<M: ResourceModel> GenericHandler<M> {
    /// Removes children of `parent` owned by the context's agent and not touched after `epoch`.
    pub(crate) fn sweep(&self, ctx: &mut Context, parent: &str, epoch: u64) {
        if !ctx.mode.sweeps() {
            return;
        }
        let Some(agent_id) = ctx.agent_id().map(str::to_string) else {
            return;
        };
        let stale = self.store().keys_where(|m, touched| {
            let header = m.header();
            header.parent_uuid == parent && header.agent_id == agent_id && touched <= epoch
        });
        for uuid in stale {
            info!(mode = %ctx.mode, component = %M::COMPONENT, %uuid, %parent, "Removing stale resource");
            match self.do_remove(ctx, &uuid) {
                Ok(()) => ctx.counters.removed += 1,
                Err(e) => warn!(%uuid, error = %e, "Stale resource not removed"),
            }
        }
    }

    /// Removes the subtree below `uuid`, then `uuid` itself.
    pub(crate) fn cascade_remove(&self, ctx: &mut Context, uuid: &str) -> SyncResult<()> {
        if !self.store().contains(uuid) {
            return Err(SyncError::NotFound(uuid.to_string()));
        }
        let registry = ctx.registry().clone();
        for component in self.sub_components() {
            match registry.handler_for(component) {
                Ok(handler) => {
                    handler.remove_all(ctx, uuid);
                    handler.release_ids(uuid);
                }
                Err(e) => error!(%component, error = %e, "Cannot cascade removal"),
            }
        }
        self.remove_single(ctx, uuid)
    }

    fn remove_single(&self, ctx: &mut Context, uuid: &str) -> SyncResult<()> {
        let parent = self
            .store()
            .with_entry(uuid, |m| m.header().parent_uuid.clone())
            .ok_or_else(|| SyncError::NotFound(uuid.to_string()))?;

        ctx.add_event(EventType::ResourceRemoved, M::COMPONENT, uuid);
        self.store().remove(uuid);
        self.id_policy().purge(uuid, &parent);
        let dropped = ctx.registry().forget_associations(uuid);
        debug!(mode = %ctx.mode, component = %M::COMPONENT, %uuid, associations = dropped, "Removed");
        Ok(())
    }
}
