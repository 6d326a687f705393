//! Open and close transition drivers.
//!
//! The open path is FLIP: measure the source box (First), compute the
//! enlarged target (Last), place the clone at the source, and commit the
//! target styles one animation frame later so the declared transition is
//! observed instead of coalesced (Invert/Play). The close path re-measures
//! the source's *current* box and animates back to it, then tears down after
//! the fixed duration.
//!
//! Every function here tolerates being invoked in a stale state; a scheduled
//! task that arrives after the world moved on logs and returns rather than
//! faulting.

use crate::dom::{ElementId, ObjectFit, Visibility};
use crate::elements;
use crate::engine::{TimelineEventKind, ZoomEngine};
use crate::error::{Error, Result};
use crate::geometry;
use crate::scheduler::EngineTask;
use crate::session::{ModalSession, SessionState};
use crate::triggers::{CloseTrigger, CloseTriggers};

/// Start a session for a qualifying image: hide the source, build and attach
/// the overlays at the source rect, and defer the style commit to the next
/// animation frame.
pub(crate) fn begin_open(engine: &mut ZoomEngine, image: ElementId) -> Result<()> {
    let rect = geometry::source_rect(&engine.doc, &engine.window, image)?;
    if rect.is_degenerate() {
        log::warn!("source {image} has degenerate geometry; transition will be a no-op visually");
    }
    // Captured once; the close path re-measures position but never this.
    let aspect_ratio = rect.aspect_ratio();

    let source = engine
        .doc
        .get_mut(image)
        .ok_or(Error::UnknownElement(image))?;
    // Visibility only: the source keeps its layout box, so no reflow and a
    // stable origin for the close measurement.
    source.style.visibility = Visibility::Hidden;

    let clone = elements::create_clone(&mut engine.doc, image, rect, &engine.config)?;
    let frame = elements::create_frame(&mut engine.doc, image, rect, &engine.config)?;
    let backdrop = elements::create_backdrop(&mut engine.doc, &engine.window, &engine.config);

    engine.doc.attach(backdrop);
    engine.doc.attach(frame);
    engine.doc.attach(clone);

    engine.session = Some(ModalSession::new(image, clone, frame, backdrop, aspect_ratio));
    engine.record(TimelineEventKind::SessionOpened { image });
    engine.record(TimelineEventKind::OverlaysAttached);

    // Committing start and end styles in the same synchronous step would
    // coalesce and skip the transition. Hard timing requirement.
    engine.scheduler.request_frame(EngineTask::CommitOpen);
    Ok(())
}

/// Animation-frame half of the open: move the clone to the enlarged target
/// and fade the backdrop in, then start the short timer that arms the close
/// triggers.
pub(crate) fn commit_open(engine: &mut ZoomEngine) -> Result<()> {
    let Some(session) = engine.session.as_ref() else {
        log::warn!("open commit with no active session");
        return Ok(());
    };
    if session.state() != SessionState::Opening {
        log::warn!("open commit in state {:?} ignored", session.state());
        return Ok(());
    }

    let target = geometry::target_rect(
        session.aspect_ratio,
        &engine.window,
        engine.config.bounds_fraction,
    );
    let (clone_id, backdrop_id) = (session.clone, session.backdrop);
    let radius = engine.config.enlarged_radius.clone();
    let shadow = engine.config.enlarged_shadow.clone();

    if let Some(clone) = engine.doc.get_mut(clone_id) {
        clone.style.set_rect(target);
        clone.style.border_radius = Some(radius);
        clone.style.box_shadow = Some(shadow);
        // No cropping at full size.
        clone.style.object_fit = Some(ObjectFit::Contain);
    }
    if let Some(backdrop) = engine.doc.get_mut(backdrop_id) {
        backdrop.style.opacity = Some(1.0);
    }

    // Long enough to survive the originating click's propagation, well under
    // animation completion.
    engine
        .scheduler
        .set_timeout(EngineTask::ArmClose, engine.config.arm_delay_ms);
    engine.record(TimelineEventKind::OpenCommitted);
    Ok(())
}

/// Timer half of the open: leave the frame as a faint placeholder and make
/// the session interactive by registering the close triggers.
pub(crate) fn arm_close(engine: &mut ZoomEngine) -> Result<()> {
    let (frame_id, backdrop_id, clone_id) = match engine.session.as_ref() {
        Some(s) if s.state() == SessionState::Opening => (s.frame, s.backdrop, s.clone),
        Some(s) => {
            log::warn!("trigger arming in state {:?} ignored", s.state());
            return Ok(());
        }
        None => {
            log::warn!("trigger arming with no active session");
            return Ok(());
        }
    };

    if let Some(frame) = engine.doc.get_mut(frame_id) {
        frame.style.opacity = Some(engine.config.frame_opacity);
    }

    let triggers = CloseTriggers::arm(&mut engine.listeners, backdrop_id, clone_id);
    if let Some(session) = engine.session.as_mut() {
        session.triggers = Some(triggers);
        session.transition_to(SessionState::Open)?;
    }
    engine.record(TimelineEventKind::TriggersArmed);
    Ok(())
}

/// Shared close routine behind all four triggers. The session latch makes
/// this single-fire: the first signal commits the return animation, every
/// later one falls out at the latch.
pub(crate) fn request_close(engine: &mut ZoomEngine, trigger: CloseTrigger) -> Result<()> {
    let Some(session) = engine.session.as_mut() else {
        log::warn!("close signal ({trigger}) with no active session");
        return Ok(());
    };
    if !session.latch_close() {
        return Ok(());
    }
    session.transition_to(SessionState::Closing)?;

    let source = session.source_image;
    let (clone_id, frame_id, backdrop_id) = (session.clone, session.frame, session.backdrop);
    let mut triggers = session.triggers.take();
    if let Some(t) = triggers.as_mut() {
        t.disarm(&mut engine.listeners);
    }
    engine.record(TimelineEventKind::CloseRequested { trigger });

    // The page may have scrolled or resized since opening; the return path
    // targets the source's current position, not the one captured at open.
    let origin = geometry::source_rect(&engine.doc, &engine.window, source)?;
    let (radius, shadow) = engine
        .doc
        .get(source)
        .map(|e| (e.style.border_radius.clone(), e.style.box_shadow.clone()))
        .unwrap_or((None, None));

    if let Some(clone) = engine.doc.get_mut(clone_id) {
        clone.style.set_rect(origin);
        clone.style.border_radius = radius;
        clone.style.box_shadow = shadow;
        clone.style.object_fit = Some(ObjectFit::Cover);
    }
    if let Some(frame) = engine.doc.get_mut(frame_id) {
        frame.style.opacity = Some(1.0);
    }
    if let Some(backdrop) = engine.doc.get_mut(backdrop_id) {
        backdrop.style.opacity = Some(0.0);
    }

    engine
        .scheduler
        .set_timeout(EngineTask::FinishClose, engine.config.transition_ms);
    engine.record(TimelineEventKind::CloseCommitted);
    Ok(())
}

/// End of the close animation: detach all three overlays, restore the source
/// image, and discard the session. The only point at which `Closed` is
/// reached.
pub(crate) fn finish_close(engine: &mut ZoomEngine) -> Result<()> {
    let Some(mut session) = engine.session.take() else {
        log::warn!("close teardown with no active session");
        return Ok(());
    };

    // Normally disarmed when the close signal fired; a leftover registration
    // still comes out here so no handler outlives the session.
    if let Some(mut t) = session.triggers.take() {
        t.disarm(&mut engine.listeners);
    }

    // Each removal stands alone.
    engine.doc.remove(session.clone);
    engine.doc.remove(session.frame);
    engine.doc.remove(session.backdrop);

    match engine.doc.get_mut(session.source_image) {
        Some(source) => source.style.visibility = Visibility::Visible,
        None => log::warn!("source image {} vanished during session", session.source_image),
    }

    if let Err(e) = session.transition_to(SessionState::Closed) {
        log::warn!("teardown reached from unexpected state: {e}");
    }
    engine.record(TimelineEventKind::SessionClosed);
    Ok(())
}
