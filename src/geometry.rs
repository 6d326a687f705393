//! Rect math for the open/close transition.
//!
//! Both measurements live in document coordinates: viewport-relative layout
//! boxes plus the current scroll offset, so a rect stays comparable across
//! scrolls between measurements.

use serde::{Deserialize, Serialize};

use crate::dom::{Document, ElementId};
use crate::error::{Error, Result};
use crate::Window;

/// An axis-aligned box in document coordinates (CSS pixels).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Width-to-height ratio of the box.
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x < self.right() && y >= self.top && y < self.bottom()
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

/// The element's on-screen bounding box converted to document coordinates.
///
/// Layout boxes are stored viewport-relative (the `getBoundingClientRect`
/// convention); adding the scroll offset makes the result stable while the
/// page scrolls between measurements.
pub fn source_rect(doc: &Document, window: &Window, element: ElementId) -> Result<Rect> {
    let node = doc.get(element).ok_or(Error::UnknownElement(element))?;
    let layout = node.layout.unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));
    Ok(Rect::new(
        layout.left + window.scroll_x,
        layout.top + window.scroll_y,
        layout.width,
        layout.height,
    ))
}

/// Fit a box of the given aspect ratio within `bounds_fraction` of the
/// viewport, centered, in document coordinates.
///
/// Two-step clamp: start from the width bound, derive height; if height
/// overflows its bound, clamp height and re-derive width. Both bounds hold
/// and the box is as large as either allows.
///
/// Degenerate ratios (zero, negative, non-finite) yield a zero-size centered
/// rect rather than NaN geometry; callers get a harmless no-op transition.
pub fn target_rect(aspect_ratio: f64, window: &Window, bounds_fraction: f64) -> Rect {
    let vw = window.viewport.width as f64;
    let vh = window.viewport.height as f64;

    if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
        log::warn!("degenerate aspect ratio {aspect_ratio}; collapsing target rect");
        return Rect::new(
            vw / 2.0 + window.scroll_x,
            vh / 2.0 + window.scroll_y,
            0.0,
            0.0,
        );
    }

    let max_w = vw * bounds_fraction;
    let max_h = vh * bounds_fraction;
    let mut width = max_w;
    let mut height = width / aspect_ratio;
    if height > max_h {
        height = max_h;
        width = height * aspect_ratio;
    }

    Rect::new(
        (vw - width) / 2.0 + window.scroll_x,
        (vh - height) / 2.0 + window.scroll_y,
        width,
        height,
    )
}
