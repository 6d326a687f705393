//! Close-trigger wiring for the active session.
//!
//! Four independent signals can end a session: a one-shot window scroll, an
//! Escape keydown, a backdrop click, and a clone click. Whichever fires
//! first wins; the session's close latch keeps the routine single-fire no
//! matter how many signals race in before teardown. The registration is a
//! scoped-acquisition value: arm returns a [`CloseTriggers`] holding the
//! listener ids, and disarm removes each one independently so one failed
//! removal cannot strand the rest.

use serde::{Deserialize, Serialize};

use crate::dom::ElementId;
use crate::events::{EventKind, EventTarget, ListenerAction, ListenerId, ListenerRegistry};

/// Which signal requested the close. Recorded on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseTrigger {
    Scroll,
    EscapeKey,
    BackdropClick,
    CloneClick,
}

impl std::fmt::Display for CloseTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scroll => write!(f, "scroll"),
            Self::EscapeKey => write!(f, "escape"),
            Self::BackdropClick => write!(f, "backdrop click"),
            Self::CloneClick => write!(f, "clone click"),
        }
    }
}

/// Listener ids for the four close signals of one session.
#[derive(Debug)]
pub struct CloseTriggers {
    ids: Vec<ListenerId>,
}

impl CloseTriggers {
    /// Register all four close signals against the given overlay elements.
    pub fn arm(registry: &mut ListenerRegistry, backdrop: ElementId, clone: ElementId) -> Self {
        let close = |trigger| ListenerAction::CloseSession { trigger };
        let ids = vec![
            registry.add_once(
                EventTarget::Window,
                EventKind::Scroll,
                close(CloseTrigger::Scroll),
            ),
            registry.add(
                EventTarget::Document,
                EventKind::KeyDown,
                close(CloseTrigger::EscapeKey),
            ),
            registry.add(
                EventTarget::Element(backdrop),
                EventKind::Click,
                close(CloseTrigger::BackdropClick),
            ),
            registry.add(
                EventTarget::Element(clone),
                EventKind::Click,
                close(CloseTrigger::CloneClick),
            ),
        ];
        Self { ids }
    }

    /// Deregister every remaining listener. Each removal stands alone: an id
    /// that already fired (the one-shot scroll) or was otherwise dropped is
    /// logged and skipped, and the rest still come out.
    pub fn disarm(&mut self, registry: &mut ListenerRegistry) {
        for id in self.ids.drain(..) {
            if !registry.remove(id) {
                log::debug!("close trigger {id} already deregistered");
            }
        }
    }

    pub fn is_armed(&self) -> bool {
        !self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn overlays() -> (ElementId, ElementId) {
        let mut doc = Document::new();
        (doc.create_element("div"), doc.create_element("img"))
    }

    #[test]
    fn arm_registers_all_four_signals() {
        let mut reg = ListenerRegistry::new();
        let (backdrop, clone) = overlays();
        let triggers = CloseTriggers::arm(&mut reg, backdrop, clone);
        assert!(triggers.is_armed());
        assert_eq!(reg.len(), 4);
    }

    #[test]
    fn disarm_removes_every_listener() {
        let mut reg = ListenerRegistry::new();
        let (backdrop, clone) = overlays();
        let mut triggers = CloseTriggers::arm(&mut reg, backdrop, clone);
        triggers.disarm(&mut reg);
        assert!(reg.is_empty());
        assert!(!triggers.is_armed());
    }

    #[test]
    fn disarm_survives_an_already_fired_one_shot() {
        let mut reg = ListenerRegistry::new();
        let (backdrop, clone) = overlays();
        let mut triggers = CloseTriggers::arm(&mut reg, backdrop, clone);

        // The scroll listener consumes itself on first fire.
        let actions = reg.collect(EventTarget::Window, EventKind::Scroll);
        assert_eq!(actions.len(), 1);
        assert_eq!(reg.len(), 3);

        // Disarm still removes the other three.
        triggers.disarm(&mut reg);
        assert!(reg.is_empty());
    }
}
