//! # Id Policy
//!
//! Assigns the small integer that appears in REST paths (`/Systems/3`) to each resource.
//!
//! Two numbering zones exist:
//!
//! - [`NumberingZone::Shared`]: one counter for the whole kind (top-level collections).
//! - [`NumberingZone::ParentSpace`]: one counter per parent (`/Systems/1/Processors/1` and
//!   `/Systems/2/Processors/1` may coexist).
//!
//! Counters only move forward. After a [`purge`](IdPolicy::purge) the freed integer is never
//! handed to a different uuid, so a client holding an old URL cannot silently reach a
//! replacement unit.

use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberingZone {
    Shared,
    ParentSpace,
}

#[derive(Debug, Default)]
struct Assignments {
    ids: HashMap<(String, String), u64>,
    next: HashMap<String, u64>,
}

/// Per-kind id assignment table.
#[derive(Debug)]
pub struct IdPolicy {
    zone: NumberingZone,
    inner: Mutex<Assignments>,
}

impl IdPolicy {
    pub fn new(zone: NumberingZone) -> Self {
        Self {
            zone,
            inner: Mutex::new(Assignments::default()),
        }
    }

    pub fn zone(&self) -> NumberingZone {
        self.zone
    }

    fn zone_key<'a>(&self, parent: &'a str) -> &'a str {
        match self.zone {
            NumberingZone::Shared => "",
            NumberingZone::ParentSpace => parent,
        }
    }

    /// Returns the id of `(uuid, parent)`, assigning the next free one on first use.
    pub fn id_for(&self, uuid: &str, parent: &str) -> u64 {
        let zone_key = self.zone_key(parent).to_string();
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let key = (uuid.to_string(), zone_key.clone());
        if let Some(id) = inner.ids.get(&key) {
            return *id;
        }
        let counter = inner.next.entry(zone_key).or_insert(1);
        let id = *counter;
        *counter += 1;
        inner.ids.insert(key, id);
        id
    }

    /// Forgets the assignment of `(uuid, parent)`.
    pub fn purge(&self, uuid: &str, parent: &str) {
        let key = (uuid.to_string(), self.zone_key(parent).to_string());
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        inner.ids.remove(&key);
    }

    /// Drops the counter of `parent` once it numbers no resource.
    ///
    /// Only meaningful in [`NumberingZone::ParentSpace`]. A parent that comes back is a new
    /// uuid with a counter of its own, so ids still never repeat under one parent.
    pub fn release_parent(&self, parent: &str) -> bool {
        if self.zone != NumberingZone::ParentSpace {
            return false;
        }
        let mut inner = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if inner.ids.keys().any(|(_, zone)| zone == parent) {
            return false;
        }
        inner.next.remove(parent).is_some()
    }

    pub fn counters(&self) -> usize {
        self.inner.lock().map(|inner| inner.next.len()).unwrap_or(0)
    }

    pub fn contains(&self, uuid: &str, parent: &str) -> bool {
        let key = (uuid.to_string(), self.zone_key(parent).to_string());
        self.inner
            .lock()
            .map(|inner| inner.ids.contains_key(&key))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_lookup_is_stable() {
        let policy = IdPolicy::new(NumberingZone::ParentSpace);
        let first = policy.id_for("cpu-1", "sys-1");
        assert_eq!(first, 1);
        assert_eq!(policy.id_for("cpu-1", "sys-1"), first);
        assert_eq!(policy.id_for("cpu-2", "sys-1"), 2);
    }

    #[test]
    fn purged_id_is_never_reused() {
        let policy = IdPolicy::new(NumberingZone::ParentSpace);
        let old = policy.id_for("cpu-1", "sys-1");
        policy.purge("cpu-1", "sys-1");
        assert!(!policy.contains("cpu-1", "sys-1"));

        let replacement = policy.id_for("cpu-9", "sys-1");
        assert_ne!(replacement, old);
    }

    #[test]
    fn empty_parent_counter_is_released() {
        let policy = IdPolicy::new(NumberingZone::ParentSpace);
        policy.id_for("cpu-1", "sys-1");
        policy.id_for("cpu-2", "sys-1");
        policy.purge("cpu-1", "sys-1");
        assert!(!policy.release_parent("sys-1"));

        policy.purge("cpu-2", "sys-1");
        assert!(policy.release_parent("sys-1"));
        assert_eq!(policy.counters(), 0);
    }

    #[test]
    fn shared_counter_is_never_released() {
        let policy = IdPolicy::new(NumberingZone::Shared);
        policy.id_for("sys-1", "mgr-1");
        policy.purge("sys-1", "mgr-1");
        assert!(!policy.release_parent("mgr-1"));
        assert_eq!(policy.id_for("sys-2", "mgr-1"), 2);
    }

    #[test]
    fn parent_space_numbers_each_parent_independently() {
        let policy = IdPolicy::new(NumberingZone::ParentSpace);
        assert_eq!(policy.id_for("cpu-1", "sys-1"), 1);
        assert_eq!(policy.id_for("cpu-2", "sys-2"), 1);
    }

    #[test]
    fn shared_zone_ignores_parent() {
        let policy = IdPolicy::new(NumberingZone::Shared);
        assert_eq!(policy.id_for("sys-1", "mgr-1"), 1);
        assert_eq!(policy.id_for("sys-2", "mgr-2"), 2);
        assert_eq!(policy.id_for("sys-1", "mgr-9"), 1);
    }
}
