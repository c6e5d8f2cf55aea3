//! # Operation Context
//!
//! One [`Context`] is created per top-level operation (an agent event, a poll, a load, a
//! user removal) and threaded by `&mut` through every handler the operation reaches.
//!
//! It carries:
//! - the [`Mode`] that decides whether stale siblings may be pruned,
//! - the ancestor stack used to stamp a child with its parent's kind,
//! - the accumulated outbound events and the pass [`Counters`].

use crate::agent::AgentHandle;
use crate::config::AddedEventPolicy;
use crate::event::{Event, EventType};
use crate::model::Component;
use crate::registry::HandlerRegistry;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// What triggered the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Event,
    Polling,
    Loading,
    UserAction,
    AgentDisappeared,
}

impl Mode {
    /// Only exhaustive passes may prune children they did not see.
    pub fn sweeps(&self) -> bool {
        matches!(self, Mode::Polling | Mode::Loading)
    }

    /// Modes that stamp a fetched child with its parent's kind.
    pub fn stamps_parent_type(&self) -> bool {
        matches!(self, Mode::Event | Mode::Polling | Mode::Loading)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Mode::Event => "E",
            Mode::Polling => "P",
            Mode::Loading => "L",
            Mode::UserAction => "U",
            Mode::AgentDisappeared => "A",
        };
        f.write_str(tag)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub added: u32,
    pub removed: u32,
    pub updated: u32,
    pub status_changed: u32,
    pub alerts: u32,
}

/// Per-operation state.
pub struct Context {
    pub mode: Mode,
    agent: Option<AgentHandle>,
    registry: Arc<HandlerRegistry>,
    stack: Vec<Component>,
    events: Vec<Event>,
    pub counters: Counters,
    /// Depth at which a resource was freshly added, for `AddedEventPolicy::TopLevelOnly`.
    added_at: Option<usize>,
}

impl Context {
    pub fn new(mode: Mode, agent: Option<AgentHandle>, registry: Arc<HandlerRegistry>) -> Self {
        Self {
            mode,
            agent,
            registry,
            stack: Vec::new(),
            events: Vec::new(),
            counters: Counters::default(),
            added_at: None,
        }
    }

    pub fn agent(&self) -> Option<&AgentHandle> {
        self.agent.as_ref()
    }

    pub fn agent_id(&self) -> Option<&str> {
        self.agent.as_ref().map(|a| a.id())
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn push(&mut self, component: Component) {
        self.stack.push(component);
    }

    pub fn pop(&mut self) {
        self.stack.pop();
        if self.added_at.is_some_and(|depth| depth >= self.stack.len()) {
            self.added_at = None;
        }
    }

    /// Kind of the immediate parent, `Component::None` at the top.
    pub fn parent_type(&self) -> Component {
        self.stack.last().copied().unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Marks the current depth as holding a resource added in this pass.
    pub(crate) fn mark_added(&mut self) {
        if self.added_at.is_none() {
            self.added_at = Some(self.stack.len());
        }
    }

    fn suppresses(&self, event_type: EventType) -> bool {
        event_type == EventType::ResourceAdded
            && self.registry.config().eventing.added_events == AddedEventPolicy::TopLevelOnly
            && self.added_at.is_some_and(|depth| self.stack.len() > depth)
    }

    /// Resolves `uuid` to its external reference and appends the event.
    pub fn add_event(&mut self, event_type: EventType, component: Component, uuid: &str) {
        if self.suppresses(event_type) {
            debug!(%component, %uuid, "Descendant added event suppressed");
            return;
        }
        let origin = self.registry.locate(component, uuid);
        if origin.is_none() {
            debug!(%component, %uuid, "Event recorded without reference");
        }
        self.events.push(Event {
            event_type,
            component,
            uuid: uuid.to_string(),
            origin,
        });
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Hands accumulated events to the registry's publisher.
    pub fn publish(&mut self) {
        let events = self.take_events();
        if !events.is_empty() {
            self.registry.publisher().publish(events);
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("mode", &self.mode)
            .field("agent", &self.agent_id())
            .field("stack", &self.stack)
            .field("events", &self.events.len())
            .field("counters", &self.counters)
            .finish()
    }
}
