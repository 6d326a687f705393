//! The modal session: the one stateful entity of the engine.

use serde::{Deserialize, Serialize};

use crate::dom::ElementId;
use crate::error::{Error, Result};
use crate::triggers::CloseTriggers;

/// Lifecycle states of a session. `Closed` is terminal; the session value is
/// discarded once it is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Opening,
    Open,
    Closing,
    Closed,
}

/// One open-to-close modal interaction.
///
/// Owns the three overlay elements for its lifetime; merely borrows the
/// source image, whose visibility it restores on teardown. The aspect ratio
/// is captured once at creation and never recomputed, even though the
/// source's on-screen position is re-measured for the close animation.
#[derive(Debug)]
pub struct ModalSession {
    pub source_image: ElementId,
    pub clone: ElementId,
    pub frame: ElementId,
    pub backdrop: ElementId,
    pub aspect_ratio: f64,
    state: SessionState,
    closed: bool,
    pub(crate) triggers: Option<CloseTriggers>,
}

impl ModalSession {
    pub fn new(
        source_image: ElementId,
        clone: ElementId,
        frame: ElementId,
        backdrop: ElementId,
        aspect_ratio: f64,
    ) -> Self {
        Self {
            source_image,
            clone,
            frame,
            backdrop,
            aspect_ratio,
            state: SessionState::Opening,
            closed: false,
            triggers: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Advance the state machine along a legal edge. No transition skips a
    /// state: `Opening -> Open -> Closing -> Closed`.
    pub fn transition_to(&mut self, to: SessionState) -> Result<()> {
        use SessionState::*;
        let legal = matches!(
            (self.state, to),
            (Opening, Open) | (Open, Closing) | (Closing, Closed)
        );
        if !legal {
            return Err(Error::IllegalTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }

    /// Flip the close latch. The first caller gets `true` and owns the close
    /// routine; every later caller gets `false` and must do nothing. This is
    /// what makes concurrent close signals idempotent.
    pub fn latch_close(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;
        true
    }

    pub fn is_latched(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> ModalSession {
        // Element ids are opaque; mint real ones from a scratch document.
        let mut doc = crate::dom::Document::new();
        let a = doc.create_element("img");
        let b = doc.create_element("img");
        let c = doc.create_element("div");
        let d = doc.create_element("div");
        ModalSession::new(a, b, c, d, 1.5)
    }

    #[test]
    fn transitions_follow_the_single_legal_path() {
        let mut s = session();
        assert_eq!(s.state(), SessionState::Opening);
        s.transition_to(SessionState::Open).unwrap();
        s.transition_to(SessionState::Closing).unwrap();
        s.transition_to(SessionState::Closed).unwrap();
    }

    #[test]
    fn skipping_states_is_rejected() {
        let mut s = session();
        assert!(matches!(
            s.transition_to(SessionState::Closing),
            Err(Error::IllegalTransition { .. })
        ));
        assert!(matches!(
            s.transition_to(SessionState::Closed),
            Err(Error::IllegalTransition { .. })
        ));
    }

    #[test]
    fn close_latch_fires_exactly_once() {
        let mut s = session();
        assert!(s.latch_close());
        assert!(!s.latch_close());
        assert!(!s.latch_close());
        assert!(s.is_latched());
    }
}
