//! The engine: document, window, scheduler, listeners, and the zero-or-one
//! active modal session, behind one dispatch surface.
//!
//! Hosts drive the engine in three strokes: seed a document (markup via
//! [`ZoomEngine::load_html`] or the builder API), feed input events, and
//! step the virtual clock. Everything observable comes back through
//! [`ZoomEngine::overlay_snapshot`] and the timeline.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::animation;
use crate::dom::{Document, ElementId, ObjectFit, Position, Visibility};
use crate::error::{Error, Result};
use crate::events::{EventKind, EventTarget, Key, ListenerAction, ListenerRegistry};
use crate::geometry::Rect;
use crate::lifecycle;
use crate::scheduler::{EngineTask, Scheduler};
use crate::session::{ModalSession, SessionState};
use crate::triggers::CloseTrigger;
use crate::{EngineConfig, Window};

type TransitionHandler = Arc<dyn Fn(&TimelineEvent) + Send + Sync>;

/// One entry in the engine's interaction timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Virtual time of the event in milliseconds.
    pub t: u64,
    pub kind: TimelineEventKind,
}

/// What happened. The timeline is append-only and deterministic for a given
/// input script, which is what the digest fingerprints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventKind {
    Initialized { images: usize },
    SessionOpened { image: ElementId },
    OverlaysAttached,
    OpenCommitted,
    TriggersArmed,
    ClickIgnored { image: ElementId },
    CloseRequested { trigger: CloseTrigger },
    CloseCommitted,
    SessionClosed,
}

/// Point-in-time view of one overlay element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayView {
    pub attached: bool,
    pub rect: Option<Rect>,
    pub opacity: Option<f64>,
    pub object_fit: Option<ObjectFit>,
    pub border_radius: Option<String>,
    pub box_shadow: Option<String>,
}

/// Point-in-time view of the whole modal surface, the engine's analogue of a
/// rendered snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlaySnapshot {
    pub state: Option<SessionState>,
    pub source_hidden: bool,
    pub clone: Option<OverlayView>,
    pub frame: Option<OverlayView>,
    pub backdrop: Option<OverlayView>,
    /// Attached positioned elements. Zero whenever no session is active;
    /// exactly three while one is.
    pub positioned_overlays: usize,
}

/// Headless zoom-modal engine.
pub struct ZoomEngine {
    pub(crate) config: EngineConfig,
    pub(crate) doc: Document,
    pub(crate) window: Window,
    pub(crate) scheduler: Scheduler,
    pub(crate) listeners: ListenerRegistry,
    pub(crate) session: Option<ModalSession>,
    pub(crate) initialized: bool,
    timeline: Vec<TimelineEvent>,
    on_transition: Option<TransitionHandler>,
}

impl ZoomEngine {
    /// Create an engine with an empty document.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let window = Window::new(config.viewport);
        Ok(Self {
            config,
            doc: Document::new(),
            window,
            scheduler: Scheduler::new(),
            listeners: ListenerRegistry::new(),
            session: None,
            initialized: false,
            timeline: Vec::new(),
            on_transition: None,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Current virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    // --- Document building -------------------------------------------------

    /// Append a qualifying `<figure class="..."><img></figure>` pair with
    /// the given viewport-relative layout box. Convenience for hosts and
    /// tests building documents without markup.
    pub fn insert_figure_image(&mut self, layout: Rect) -> ElementId {
        let figure_class = self.config.figure_class.clone();
        let figure = self.doc.create_element("figure");
        if let Some(node) = self.doc.get_mut(figure) {
            node.classes.push(figure_class);
        }
        self.doc.attach(figure);

        let img = self.doc.create_element("img");
        if let Some(node) = self.doc.get_mut(img) {
            node.layout = Some(layout);
        }
        self.doc.set_parent(img, figure);
        self.doc.attach(img);
        img
    }

    /// Replace an element's viewport-relative layout box, e.g. after the
    /// host reflows the page.
    pub fn set_layout_rect(&mut self, element: ElementId, layout: Rect) -> Result<()> {
        let node = self
            .doc
            .get_mut(element)
            .ok_or(Error::UnknownElement(element))?;
        node.layout = Some(layout);
        Ok(())
    }

    // --- Lifecycle ---------------------------------------------------------

    /// One-time scan binding a click handler to every qualifying image.
    /// Idempotent; returns the number of images bound (zero on re-runs and
    /// on documents with no qualifying images).
    pub fn initialize(&mut self) -> Result<usize> {
        lifecycle::initialize(self)
    }

    pub fn session_state(&self) -> Option<SessionState> {
        self.session.as_ref().map(|s| s.state())
    }

    // --- Input dispatch ----------------------------------------------------

    /// Click an element directly.
    pub fn dispatch_click(&mut self, target: ElementId) -> Result<()> {
        if !self.doc.contains(target) {
            return Err(Error::UnknownElement(target));
        }
        let actions = self
            .listeners
            .collect(EventTarget::Element(target), EventKind::Click);
        self.perform_all(actions)
    }

    /// Click at a document-coordinate point; resolves the topmost attached
    /// element under it. Points over nothing are a no-op.
    pub fn dispatch_click_at(&mut self, x: f64, y: f64) -> Result<()> {
        match self
            .doc
            .hit_test(x, y, self.window.scroll_x, self.window.scroll_y)
        {
            Some(el) => self.dispatch_click(el),
            None => Ok(()),
        }
    }

    /// Key press dispatched at the document level. Close listeners only
    /// react to the cancel key; everything else passes through them.
    pub fn dispatch_key(&mut self, key: &Key) -> Result<()> {
        let actions = self
            .listeners
            .collect(EventTarget::Document, EventKind::KeyDown);
        for action in actions {
            let escape_only = matches!(
                action,
                ListenerAction::CloseSession {
                    trigger: CloseTrigger::EscapeKey
                }
            );
            if escape_only && *key != Key::Escape {
                continue;
            }
            self.perform(action)?;
        }
        Ok(())
    }

    /// Scroll the window by a delta, then fire scroll listeners. The offset
    /// mutates before dispatch so close-path measurements see the new
    /// position.
    pub fn dispatch_scroll(&mut self, dx: f64, dy: f64) -> Result<()> {
        self.window.scroll_x = (self.window.scroll_x + dx).max(0.0);
        self.window.scroll_y = (self.window.scroll_y + dy).max(0.0);
        let actions = self.listeners.collect(EventTarget::Window, EventKind::Scroll);
        self.perform_all(actions)
    }

    /// Resize the viewport, then fire resize listeners. Layout boxes are the
    /// host's to refresh via [`ZoomEngine::set_layout_rect`].
    pub fn dispatch_resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.window.viewport.width = width;
        self.window.viewport.height = height;
        let actions = self.listeners.collect(EventTarget::Window, EventKind::Resize);
        self.perform_all(actions)
    }

    fn perform_all(&mut self, actions: Vec<ListenerAction>) -> Result<()> {
        for action in actions {
            self.perform(action)?;
        }
        Ok(())
    }

    fn perform(&mut self, action: ListenerAction) -> Result<()> {
        match action {
            ListenerAction::OpenModal { image } => lifecycle::handle_image_click(self, image),
            ListenerAction::CloseSession { trigger } => animation::request_close(self, trigger),
        }
    }

    // --- Clock -------------------------------------------------------------

    /// Run one animation frame: execute every task queued before the frame
    /// started. Tasks queued during the frame wait for the next one.
    pub fn run_frame(&mut self) {
        for task in self.scheduler.take_frame_batch() {
            self.execute(task);
        }
    }

    /// Advance virtual time, firing due timers in deadline order.
    pub fn advance(&mut self, ms: u64) {
        let target = self.scheduler.now() + ms;
        while let Some(task) = self.scheduler.pop_due(target) {
            self.execute(task);
        }
        self.scheduler.settle_at(target);
    }

    /// Alternate frames and timers until both queues drain, advancing the
    /// clock to each timer deadline along the way.
    pub fn run_until_idle(&mut self) {
        loop {
            if self.scheduler.has_frame_work() {
                self.run_frame();
                continue;
            }
            match self.scheduler.next_deadline() {
                Some(deadline) => {
                    let delta = deadline.saturating_sub(self.scheduler.now());
                    self.advance(delta);
                }
                None => break,
            }
        }
    }

    fn execute(&mut self, task: EngineTask) {
        let result = match task {
            EngineTask::CommitOpen => animation::commit_open(self),
            EngineTask::ArmClose => animation::arm_close(self),
            EngineTask::FinishClose => animation::finish_close(self),
        };
        // Scheduled work never surfaces to the host as an error; a mistimed
        // transition is a visual defect, not a fault.
        if let Err(e) = result {
            log::warn!("scheduled task {task:?} failed: {e}");
        }
    }

    // --- Introspection -----------------------------------------------------

    /// Snapshot of the modal surface for assertions and rendering.
    pub fn overlay_snapshot(&self) -> OverlaySnapshot {
        let view = |id: ElementId| -> Option<OverlayView> {
            let node = self.doc.get(id)?;
            Some(OverlayView {
                attached: node.is_attached(),
                rect: node.style.rect(),
                opacity: node.style.opacity,
                object_fit: node.style.object_fit,
                border_radius: node.style.border_radius.clone(),
                box_shadow: node.style.box_shadow.clone(),
            })
        };
        let positioned_overlays = self
            .doc
            .iter()
            .filter(|(_, e)| e.is_attached() && e.style.position != Position::Static)
            .count();
        let source_hidden = self
            .session
            .as_ref()
            .and_then(|s| self.doc.get(s.source_image))
            .map(|e| e.style.visibility == Visibility::Hidden)
            .unwrap_or(false);
        OverlaySnapshot {
            state: self.session_state(),
            source_hidden,
            clone: self.session.as_ref().and_then(|s| view(s.clone)),
            frame: self.session.as_ref().and_then(|s| view(s.frame)),
            backdrop: self.session.as_ref().and_then(|s| view(s.backdrop)),
            positioned_overlays,
        }
    }

    /// The interaction timeline so far.
    pub fn timeline(&self) -> &[TimelineEvent] {
        &self.timeline
    }

    /// SHA-256 fingerprint of the timeline. Two engines fed the same input
    /// script produce the same digest; determinism tests pin on this.
    pub fn timeline_digest(&self) -> Result<String> {
        let bytes = serde_json::to_vec(&self.timeline)
            .map_err(|e| Error::Other(format!("timeline serialization failed: {e}")))?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Register a callback invoked on every timeline event.
    pub fn on_transition<F>(&mut self, cb: F)
    where
        F: Fn(&TimelineEvent) + Send + Sync + 'static,
    {
        self.on_transition = Some(Arc::new(cb));
    }

    /// Remove a previously registered transition callback if any.
    pub fn clear_on_transition(&mut self) {
        self.on_transition = None;
    }

    pub(crate) fn record(&mut self, kind: TimelineEventKind) {
        let event = TimelineEvent {
            t: self.scheduler.now(),
            kind,
        };
        if let Some(cb) = &self.on_transition {
            cb(&event);
        }
        self.timeline.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ZoomEngine {
        ZoomEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn click_on_unknown_element_is_an_error() {
        let mut e = engine();
        let img = e.insert_figure_image(Rect::new(0.0, 0.0, 10.0, 10.0));
        e.document_mut().remove(img);
        assert!(matches!(
            e.dispatch_click(img),
            Err(Error::UnknownElement(_))
        ));
    }

    #[test]
    fn click_at_empty_space_is_a_no_op() {
        let mut e = engine();
        e.insert_figure_image(Rect::new(0.0, 0.0, 10.0, 10.0));
        e.initialize().unwrap();
        e.dispatch_click_at(500.0, 500.0).unwrap();
        assert_eq!(e.session_state(), None);
    }

    #[test]
    fn scroll_offset_clamps_at_zero() {
        let mut e = engine();
        e.dispatch_scroll(-100.0, -100.0).unwrap();
        assert_eq!(e.window().scroll_x, 0.0);
        assert_eq!(e.window().scroll_y, 0.0);
    }

    #[test]
    fn transition_callback_sees_every_event() {
        use std::sync::Mutex;
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut e = engine();
        e.on_transition(move |ev| sink.lock().unwrap().push(ev.kind.clone()));
        e.insert_figure_image(Rect::new(100.0, 200.0, 300.0, 200.0));
        e.initialize().unwrap();

        let events = seen.lock().unwrap();
        assert_eq!(
            events.as_slice(),
            &[TimelineEventKind::Initialized { images: 1 }][..]
        );
    }

    #[test]
    fn timeline_digest_is_stable_for_identical_histories() {
        let mut a = engine();
        let mut b = engine();
        for e in [&mut a, &mut b] {
            e.insert_figure_image(Rect::new(100.0, 200.0, 300.0, 200.0));
            e.initialize().unwrap();
        }
        assert_eq!(a.timeline_digest().unwrap(), b.timeline_digest().unwrap());
    }
}
