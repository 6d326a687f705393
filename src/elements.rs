//! Factory for the three transition overlay elements.
//!
//! All three are created detached; the caller decides when they join the
//! document, which keeps creation pure and lets tests inspect an overlay
//! before any document mutation has happened.
//!
//! Paint order is fixed by z-index: backdrop below frame below clone.

use crate::dom::{Document, ElementId, ObjectFit, Position};
use crate::error::{Error, Result};
use crate::geometry::Rect;
use crate::{EngineConfig, Window};

const BACKDROP_Z_INDEX: i32 = 999;
const FRAME_Z_INDEX: i32 = 1000;
const CLONE_Z_INDEX: i32 = 1001;

/// Visual duplicate of the source image, positioned exactly over `rect`.
///
/// Copies the source's attributes and its computed corner radius and shadow
/// so the duplicate is indistinguishable from the original at creation time.
/// Starts cropped like the thumbnail (`cover`); the open animation switches
/// it to `contain` at the enlarged target.
pub fn create_clone(
    doc: &mut Document,
    image: ElementId,
    rect: Rect,
    config: &EngineConfig,
) -> Result<ElementId> {
    let source = doc.get(image).ok_or(Error::UnknownElement(image))?;
    let attrs = source.attrs.clone();
    let radius = source.style.border_radius.clone();
    let shadow = source.style.box_shadow.clone();

    let clone = doc.create_element("img");
    let node = doc.get_mut(clone).ok_or(Error::UnknownElement(clone))?;
    node.attrs = attrs;
    node.style.position = Position::Absolute;
    node.style.set_rect(rect);
    node.style.z_index = Some(CLONE_Z_INDEX);
    node.style.margin = Some("0".into());
    node.style.border_radius = radius;
    node.style.box_shadow = shadow;
    node.style.transition = Some(format!("all {}ms ease-in-out", config.transition_ms));
    node.style.cursor = Some("zoom-out".into());
    node.style.background = Some("white".into());
    node.style.object_fit = Some(ObjectFit::Cover);
    Ok(clone)
}

/// Non-interactive placeholder matching `rect`, masking the hidden original
/// until its own fade completes. Fully opaque at creation; sits beneath the
/// clone.
pub fn create_frame(
    doc: &mut Document,
    image: ElementId,
    rect: Rect,
    config: &EngineConfig,
) -> Result<ElementId> {
    let radius = doc
        .get(image)
        .ok_or(Error::UnknownElement(image))?
        .style
        .border_radius
        .clone();

    let frame = doc.create_element("div");
    let node = doc.get_mut(frame).ok_or(Error::UnknownElement(frame))?;
    node.style.position = Position::Absolute;
    node.style.set_rect(rect);
    node.style.z_index = Some(FRAME_Z_INDEX);
    node.style.border_radius = radius;
    node.style.box_sizing = Some("border-box".into());
    node.style.background = Some("transparent".into());
    node.style.pointer_events_none = true;
    node.style.opacity = Some(1.0);
    node.style.transition = Some(format!("opacity {}ms ease-in-out", config.transition_ms));
    Ok(frame)
}

/// Full-viewport dimming layer. Starts transparent; the open animation fades
/// it to opaque after insertion.
pub fn create_backdrop(doc: &mut Document, window: &Window, config: &EngineConfig) -> ElementId {
    let backdrop = doc.create_element("div");
    if let Some(node) = doc.get_mut(backdrop) {
        node.classes.push(config.backdrop_class.clone());
        node.style.position = Position::Fixed;
        node.style.z_index = Some(BACKDROP_Z_INDEX);
        node.style.set_rect(Rect::new(
            0.0,
            0.0,
            window.viewport.width as f64,
            window.viewport.height as f64,
        ));
        node.style.opacity = Some(0.0);
        node.style.transition = Some(format!("opacity {}ms ease-in-out", config.transition_ms));
    }
    backdrop
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Viewport;

    fn setup() -> (Document, ElementId, EngineConfig, Window) {
        let mut doc = Document::new();
        let img = doc.create_element("img");
        {
            let node = doc.get_mut(img).unwrap();
            node.attrs.insert("src".into(), "/assets/cat.jpg".into());
            node.style.border_radius = Some("8px".into());
            node.style.box_shadow = Some("0 1px 4px #0003".into());
        }
        doc.attach(img);
        let config = EngineConfig::default();
        let window = Window::new(Viewport {
            width: 1000,
            height: 800,
        });
        (doc, img, config, window)
    }

    #[test]
    fn clone_copies_source_styling_and_starts_cropped() {
        let (mut doc, img, config, _) = setup();
        let rect = Rect::new(100.0, 200.0, 300.0, 200.0);
        let clone = create_clone(&mut doc, img, rect, &config).unwrap();
        let node = doc.get(clone).unwrap();
        assert_eq!(node.attrs.get("src").map(String::as_str), Some("/assets/cat.jpg"));
        assert_eq!(node.style.border_radius.as_deref(), Some("8px"));
        assert_eq!(node.style.box_shadow.as_deref(), Some("0 1px 4px #0003"));
        assert_eq!(node.style.object_fit, Some(ObjectFit::Cover));
        assert_eq!(node.style.rect(), Some(rect));
        assert!(!node.is_attached());
    }

    #[test]
    fn frame_is_opaque_and_non_interactive() {
        let (mut doc, img, config, _) = setup();
        let rect = Rect::new(100.0, 200.0, 300.0, 200.0);
        let frame = create_frame(&mut doc, img, rect, &config).unwrap();
        let node = doc.get(frame).unwrap();
        assert_eq!(node.style.opacity, Some(1.0));
        assert!(node.style.pointer_events_none);
        assert_eq!(node.style.rect(), Some(rect));
        assert!(!node.is_attached());
    }

    #[test]
    fn clone_paints_above_frame() {
        let (mut doc, img, config, _) = setup();
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let clone = create_clone(&mut doc, img, rect, &config).unwrap();
        let frame = create_frame(&mut doc, img, rect, &config).unwrap();
        let cz = doc.get(clone).unwrap().style.z_index.unwrap();
        let fz = doc.get(frame).unwrap().style.z_index.unwrap();
        assert!(cz > fz);
    }

    #[test]
    fn backdrop_starts_transparent_and_covers_the_viewport() {
        let (mut doc, _, config, window) = setup();
        let backdrop = create_backdrop(&mut doc, &window, &config);
        let node = doc.get(backdrop).unwrap();
        assert!(node.has_class("image-modal-backdrop"));
        assert_eq!(node.style.opacity, Some(0.0));
        assert_eq!(
            node.style.rect(),
            Some(Rect::new(0.0, 0.0, 1000.0, 800.0))
        );
        assert!(!node.is_attached());
    }

    #[test]
    fn clone_of_unknown_element_is_an_error() {
        let (mut doc, img, config, _) = setup();
        doc.remove(img);
        let err = create_clone(&mut doc, img, Rect::new(0.0, 0.0, 1.0, 1.0), &config);
        assert!(matches!(err, Err(Error::UnknownElement(_))));
    }
}
