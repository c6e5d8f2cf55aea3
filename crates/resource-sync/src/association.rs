//! # Many-to-Many Associations
//!
//! Weak relations (a zone lists endpoints it does not own) are kept outside the per-kind
//! stores in an [`AssociationTable`] of `(owner, member)` pairs, each stamped with the agent
//! that reported it.
//!
//! The table is never edited piecemeal by events. It is reconciled against the agent's
//! current member list with [`diff`], so after each reconciliation it equals the fetched
//! truth regardless of what it held before.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

/// Changes that turn `previous` into `fetched`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diff {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

/// Computes `fetched - previous` and `previous - fetched` on de-duplicated sets.
pub fn diff(fetched: &[String], previous: &[String]) -> Diff {
    let fetched: BTreeSet<&String> = fetched.iter().collect();
    let previous: BTreeSet<&String> = previous.iter().collect();
    Diff {
        to_add: fetched.difference(&previous).map(|s| s.to_string()).collect(),
        to_remove: previous.difference(&fetched).map(|s| s.to_string()).collect(),
    }
}

/// `(owner, member) -> agent` rows of one weak relation.
#[derive(Debug)]
pub struct AssociationTable {
    name: String,
    rows: Mutex<BTreeMap<(String, String), String>>,
}

impl AssociationTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn rows(&self) -> MutexGuard<'_, BTreeMap<(String, String), String>> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_entry(&self, owner: &str, member: &str, agent_id: &str) {
        self.rows()
            .insert((owner.to_string(), member.to_string()), agent_id.to_string());
    }

    pub fn remove_entry(&self, owner: &str, member: &str) -> bool {
        self.rows()
            .remove(&(owner.to_string(), member.to_string()))
            .is_some()
    }

    pub fn contains(&self, owner: &str, member: &str) -> bool {
        self.rows()
            .contains_key(&(owner.to_string(), member.to_string()))
    }

    pub fn members(&self, owner: &str) -> Vec<String> {
        self.rows()
            .keys()
            .filter(|(o, _)| o == owner)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn owners(&self, member: &str) -> Vec<String> {
        self.rows()
            .keys()
            .filter(|(_, m)| m == member)
            .map(|(o, _)| o.clone())
            .collect()
    }

    /// Drops every row in which `uuid` is the owner or the member.
    pub fn forget(&self, uuid: &str) -> usize {
        let mut rows = self.rows();
        let before = rows.len();
        rows.retain(|(owner, member), _| owner != uuid && member != uuid);
        before - rows.len()
    }

    /// Drops every row stamped with `agent_id`.
    pub fn remove_agent(&self, agent_id: &str) -> usize {
        let mut rows = self.rows();
        let before = rows.len();
        rows.retain(|_, agent| agent != agent_id);
        before - rows.len()
    }

    /// Applies `diff` to the members of `owner`.
    pub fn apply(&self, owner: &str, agent_id: &str, diff: &Diff) {
        let mut rows = self.rows();
        for member in &diff.to_add {
            rows.insert((owner.to_string(), member.clone()), agent_id.to_string());
        }
        for member in &diff.to_remove {
            rows.remove(&(owner.to_string(), member.clone()));
        }
    }

    pub fn len(&self) -> usize {
        self.rows().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn diff_is_set_difference_both_ways() {
        let d = diff(&set(&["x", "y"]), &set(&["y", "z"]));
        assert_eq!(d.to_add, set(&["x"]));
        assert_eq!(d.to_remove, set(&["z"]));
    }

    #[test]
    fn diff_ignores_duplicates() {
        let d = diff(&set(&["x", "x", "y"]), &set(&["y", "y"]));
        assert_eq!(d.to_add, set(&["x"]));
        assert!(d.to_remove.is_empty());
    }

    #[test]
    fn applying_diff_converges_to_fetched() {
        let table = AssociationTable::new("zone-endpoints");
        table.add_entry("zone-1", "y", "agent-1");
        table.add_entry("zone-1", "z", "agent-1");
        table.add_entry("zone-2", "z", "agent-1");

        let fetched = set(&["x", "y"]);
        let d = diff(&fetched, &table.members("zone-1"));
        table.apply("zone-1", "agent-1", &d);

        assert_eq!(table.members("zone-1"), fetched);
        assert_eq!(table.members("zone-2"), set(&["z"]));
    }

    #[test]
    fn forget_and_remove_agent_prune_rows() {
        let table = AssociationTable::new("zone-endpoints");
        table.add_entry("zone-1", "ep-1", "agent-1");
        table.add_entry("zone-1", "ep-2", "agent-1");
        table.add_entry("zone-2", "ep-1", "agent-2");

        assert_eq!(table.forget("ep-2"), 1);
        assert_eq!(table.owners("ep-1"), set(&["zone-1", "zone-2"]));
        assert_eq!(table.remove_agent("agent-2"), 1);
        assert_eq!(table.len(), 1);
        assert!(table.contains("zone-1", "ep-1"));
    }
}
