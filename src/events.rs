//! Input events and the listener registry.
//!
//! Listeners are explicit records, not captured closures: each one binds a
//! (target, event kind) pair to a typed [`ListenerAction`] the engine knows
//! how to perform. Handles are stable [`ListenerId`]s so registration is a
//! scoped acquisition that teardown can undo listener by listener.

use serde::{Deserialize, Serialize};

use crate::dom::ElementId;
use crate::triggers::CloseTrigger;

/// Key identity for keydown dispatch. Only the cancel key is meaningful to
/// the engine; everything else is carried through for hosts that care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other(String),
}

/// What a listener is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget {
    Window,
    Document,
    Element(ElementId),
}

/// The event families the engine dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Click,
    KeyDown,
    Scroll,
    Resize,
}

/// Typed behavior a listener performs when its event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerAction {
    /// A qualifying image was clicked; open a session for it.
    OpenModal { image: ElementId },
    /// A close signal fired for the active session.
    CloseSession { trigger: CloseTrigger },
}

/// Stable handle to a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Listener {
    id: ListenerId,
    target: EventTarget,
    kind: EventKind,
    action: ListenerAction,
    once: bool,
}

/// Flat listener table with stable ids.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    listeners: Vec<Listener>,
    next_id: u64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, target: EventTarget, kind: EventKind, action: ListenerAction) -> ListenerId {
        self.add_inner(target, kind, action, false)
    }

    /// Register a listener that deregisters itself after its first match
    /// (the `{ once: true }` convention).
    pub fn add_once(
        &mut self,
        target: EventTarget,
        kind: EventKind,
        action: ListenerAction,
    ) -> ListenerId {
        self.add_inner(target, kind, action, true)
    }

    fn add_inner(
        &mut self,
        target: EventTarget,
        kind: EventKind,
        action: ListenerAction,
        once: bool,
    ) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            target,
            kind,
            action,
            once,
        });
        id
    }

    /// Deregister one listener. Returns false when the id is already gone;
    /// callers treat that as a warning, never a failure, so removing the
    /// remaining listeners proceeds regardless.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    /// Collect the actions registered for (target, kind) in registration
    /// order, dropping one-shot entries from the table before any action
    /// runs. Snapshotting first keeps dispatch well-defined when an action
    /// mutates the registry.
    pub fn collect(&mut self, target: EventTarget, kind: EventKind) -> Vec<ListenerAction> {
        let matched: Vec<(ListenerId, ListenerAction, bool)> = self
            .listeners
            .iter()
            .filter(|l| l.target == target && l.kind == kind)
            .map(|l| (l.id, l.action, l.once))
            .collect();
        for (id, _, once) in &matched {
            if *once {
                self.remove(*id);
            }
        }
        matched.into_iter().map(|(_, action, _)| action).collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn once_listeners_fire_a_single_time() {
        let mut reg = ListenerRegistry::new();
        reg.add_once(
            EventTarget::Window,
            EventKind::Scroll,
            ListenerAction::CloseSession {
                trigger: CloseTrigger::Scroll,
            },
        );
        assert_eq!(reg.collect(EventTarget::Window, EventKind::Scroll).len(), 1);
        assert!(reg.collect(EventTarget::Window, EventKind::Scroll).is_empty());
    }

    #[test]
    fn remove_reports_missing_ids() {
        let mut reg = ListenerRegistry::new();
        let id = reg.add(
            EventTarget::Document,
            EventKind::KeyDown,
            ListenerAction::CloseSession {
                trigger: CloseTrigger::EscapeKey,
            },
        );
        assert!(reg.remove(id));
        assert!(!reg.remove(id));
    }

    #[test]
    fn collect_filters_by_target_and_kind() {
        let mut reg = ListenerRegistry::new();
        reg.add(
            EventTarget::Window,
            EventKind::Scroll,
            ListenerAction::CloseSession {
                trigger: CloseTrigger::Scroll,
            },
        );
        assert!(reg.collect(EventTarget::Window, EventKind::Click).is_empty());
        assert!(reg.collect(EventTarget::Document, EventKind::Scroll).is_empty());
        assert_eq!(reg.collect(EventTarget::Window, EventKind::Scroll).len(), 1);
    }
}
