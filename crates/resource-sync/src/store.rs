//! # Keyed Store
//!
//! One [`ResourceStore`] exists per resource kind. It maps uuid to resource value in
//! insertion order and keeps an **epoch** counter that moves forward on every upsert.
//!
//! ## Touched Stamps
//!
//! Each entry records the epoch of its last upsert. A sync pass captures the epoch before it
//! starts; anything still stamped at or below that value afterwards was not seen by the
//! pass and is stale.
//!
//! ## Locking
//!
//! The store is guarded by its own `RwLock`, so different kinds never contend. Guards are
//! never returned to callers: reads either clone the value or run a short closure.

use crate::model::ResourceModel;
use indexmap::IndexMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Outcome of an upsert, ordered from "nothing happened" to "new entry".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    NoUpdate,
    StatusChanged,
    Updated,
    Added,
}

#[derive(Debug)]
struct Entry<M> {
    value: M,
    touched: u64,
}

#[derive(Debug)]
struct StoreInner<M> {
    entries: IndexMap<String, Entry<M>>,
    epoch: u64,
}

/// Per-kind keyed store with an epoch counter.
#[derive(Debug)]
pub struct ResourceStore<M> {
    inner: RwLock<StoreInner<M>>,
}

impl<M: ResourceModel> Default for ResourceStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ResourceModel> ResourceStore<M> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                entries: IndexMap::new(),
                epoch: 0,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreInner<M>> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreInner<M>> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Inserts or replaces `value`, stamping it with the new epoch.
    ///
    /// Status is compared first: a changed status wins over any other difference.
    pub fn upsert(&self, value: M) -> UpdateStatus {
        let mut inner = self.write();
        inner.epoch += 1;
        let epoch = inner.epoch;
        let uuid = value.header().uuid.clone();

        match inner.entries.get_mut(&uuid) {
            Some(entry) => {
                entry.touched = epoch;
                let status = if entry.value.header().status != value.header().status {
                    UpdateStatus::StatusChanged
                } else if entry.value != value {
                    UpdateStatus::Updated
                } else {
                    UpdateStatus::NoUpdate
                };
                if status != UpdateStatus::NoUpdate {
                    entry.value = value;
                }
                status
            }
            None => {
                inner.entries.insert(
                    uuid,
                    Entry {
                        value,
                        touched: epoch,
                    },
                );
                UpdateStatus::Added
            }
        }
    }

    pub fn get(&self, uuid: &str) -> Option<M> {
        self.read().entries.get(uuid).map(|e| e.value.clone())
    }

    /// Runs `f` against the stored value while holding the read lock.
    pub fn with_entry<R>(&self, uuid: &str, f: impl FnOnce(&M) -> R) -> Option<R> {
        let inner = self.read();
        inner.entries.get(uuid).map(|e| f(&e.value))
    }

    pub fn remove(&self, uuid: &str) -> Option<M> {
        self.write().entries.shift_remove(uuid).map(|e| e.value)
    }

    pub fn contains(&self, uuid: &str) -> bool {
        self.read().entries.contains_key(uuid)
    }

    /// Uuids of every child of `parent`, in insertion order.
    pub fn keys(&self, parent: &str) -> Vec<String> {
        self.keys_where(|value, _| value.header().parent_uuid == parent)
    }

    /// Uuids whose value and touched stamp satisfy `filter`.
    pub fn keys_where(&self, filter: impl Fn(&M, u64) -> bool) -> Vec<String> {
        self.read()
            .entries
            .iter()
            .filter(|(_, e)| filter(&e.value, e.touched))
            .map(|(uuid, _)| uuid.clone())
            .collect()
    }

    pub fn all_keys(&self) -> Vec<String> {
        self.read().entries.keys().cloned().collect()
    }

    pub fn touched(&self, uuid: &str) -> Option<u64> {
        self.read().entries.get(uuid).map(|e| e.touched)
    }

    pub fn current_epoch(&self) -> u64 {
        self.read().epoch
    }

    pub fn len(&self) -> usize {
        self.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
