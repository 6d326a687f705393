//! Top-level modal lifecycle: the one-time document scan and the click
//! policy guarding session creation.

use crate::animation;
use crate::dom::ElementId;
use crate::engine::{TimelineEventKind, ZoomEngine};
use crate::error::Result;
use crate::events::{EventKind, EventTarget, ListenerAction};

/// One-time scan for qualifying images: set the zoom cursor and bind a click
/// listener on each. Idempotent; re-runs bind nothing. A document with no
/// qualifying images is a no-op.
pub(crate) fn initialize(engine: &mut ZoomEngine) -> Result<usize> {
    if engine.initialized {
        log::debug!("initialize called twice; ignoring");
        return Ok(0);
    }

    let images = engine.doc.qualifying_images(&engine.config.figure_class);
    for &image in &images {
        if let Some(node) = engine.doc.get_mut(image) {
            node.style.cursor = Some("zoom-in".into());
        }
        engine.listeners.add(
            EventTarget::Element(image),
            EventKind::Click,
            ListenerAction::OpenModal { image },
        );
    }

    engine.initialized = true;
    engine.record(TimelineEventKind::Initialized {
        images: images.len(),
    });
    Ok(images.len())
}

/// Click policy: one session at a time. A qualifying click while any session
/// is active (opening, open, or closing) is ignored; the next click after
/// teardown opens normally.
pub(crate) fn handle_image_click(engine: &mut ZoomEngine, image: ElementId) -> Result<()> {
    if engine.session.is_some() {
        log::debug!("click on {image} ignored while a session is active");
        engine.record(TimelineEventKind::ClickIgnored { image });
        return Ok(());
    }
    animation::begin_open(engine, image)
}
