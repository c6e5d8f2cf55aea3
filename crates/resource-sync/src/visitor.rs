//! # Subtree Visitors
//!
//! Derived values over a resource subtree (worst health, counts) are computed by walking
//! the handlers' stores with a [`ResourceVisitor`]. Handlers drive the walk through
//! [`Handler::accept`](crate::handler::Handler::accept); the visitor only sees one resource
//! at a time, through the [`VisitedResource`] view of the stored model.
//!
//! The visited set lives in a [`Traversal`] created per walk, so a visitor can be reused
//! and an accidental cycle in parent links still terminates.

use crate::model::{Component, Health, ResourceHeader, ResourceModel};
use serde_json::Value;
use std::any::Any;
use std::collections::HashSet;

/// Read-only view of one stored resource, valid for the duration of a `visit` call.
pub trait VisitedResource {
    fn header(&self) -> &ResourceHeader;

    /// The concrete model, for visitors that know which kinds they fold.
    fn as_any(&self) -> &dyn Any;

    /// Every attribute, as the resource would be serialized.
    fn to_value(&self) -> Value;
}

impl<M: ResourceModel> VisitedResource for M {
    fn header(&self) -> &ResourceHeader {
        ResourceModel::header(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Callback invoked once per reachable resource.
pub trait ResourceVisitor: Send {
    /// Returns `false` to stop the whole traversal.
    fn visit(&mut self, resource: &dyn VisitedResource, component: Component) -> bool;
}

/// State of one walk: the visitor plus the uuids already visited.
pub struct Traversal<'a> {
    visitor: &'a mut dyn ResourceVisitor,
    visited: HashSet<String>,
}

impl<'a> Traversal<'a> {
    pub fn new(visitor: &'a mut dyn ResourceVisitor) -> Self {
        Self {
            visitor,
            visited: HashSet::new(),
        }
    }

    pub fn is_visited(&self, uuid: &str) -> bool {
        self.visited.contains(uuid)
    }

    pub fn mark_visited(&mut self, uuid: &str) {
        self.visited.insert(uuid.to_string());
    }

    pub fn visit(&mut self, resource: &dyn VisitedResource, component: Component) -> bool {
        self.visitor.visit(resource, component)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

/// Folds the worst health over a subtree.
#[derive(Debug, Clone)]
pub struct HealthRollup {
    filter: Option<Component>,
    health: Health,
}

impl Default for HealthRollup {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HealthRollup {
    /// `filter` restricts the fold to one resource kind.
    pub fn new(filter: Option<Component>) -> Self {
        Self {
            filter,
            health: Health::Ok,
        }
    }

    pub fn health(&self) -> Health {
        self.health
    }
}

impl ResourceVisitor for HealthRollup {
    fn visit(&mut self, resource: &dyn VisitedResource, component: Component) -> bool {
        if self.filter.map_or(true, |kind| kind == component) {
            if let Some(health) = resource.header().status.health {
                self.health = self.health.max(health);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id_policy::NumberingZone;
    use crate::model::{State, Status};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Fan {
        #[serde(flatten)]
        header: ResourceHeader,
        rpm: u32,
    }

    impl ResourceModel for Fan {
        const COMPONENT: Component = Component::Processor;
        const NUMBERING: NumberingZone = NumberingZone::ParentSpace;
        fn header(&self) -> &ResourceHeader {
            &self.header
        }
        fn header_mut(&mut self) -> &mut ResourceHeader {
            &mut self.header
        }
    }

    fn fan(health: Health) -> Fan {
        Fan {
            header: ResourceHeader {
                status: Status::new(State::Enabled, health),
                ..Default::default()
            },
            rpm: 4200,
        }
    }

    #[test]
    fn rollup_keeps_worst_health() {
        let mut rollup = HealthRollup::default();
        for health in [Health::Ok, Health::Ok, Health::Warning, Health::Critical] {
            assert!(rollup.visit(&fan(health), Component::Processor));
        }
        assert_eq!(rollup.health(), Health::Critical);
    }

    #[test]
    fn rollup_filter_skips_other_kinds() {
        let mut rollup = HealthRollup::new(Some(Component::Drive));
        rollup.visit(&fan(Health::Critical), Component::Processor);
        assert_eq!(rollup.health(), Health::Ok);
    }

    #[test]
    fn visited_resource_exposes_kind_attributes() {
        let fan = fan(Health::Ok);
        let view: &dyn VisitedResource = &fan;
        assert_eq!(view.as_any().downcast_ref::<Fan>().map(|f| f.rpm), Some(4200));
        assert_eq!(view.to_value()["rpm"], 4200);
        assert_eq!(view.header().status.health, Some(Health::Ok));
    }

    #[test]
    fn traversal_tracks_visited() {
        let mut rollup = HealthRollup::default();
        let mut traversal = Traversal::new(&mut rollup);
        assert!(!traversal.is_visited("a"));
        traversal.mark_visited("a");
        assert!(traversal.is_visited("a"));
        assert_eq!(traversal.visited_count(), 1);
    }
}
