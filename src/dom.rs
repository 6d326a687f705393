//! A small mutable document model.
//!
//! The engine does not script a real browser; it owns an arena of elements
//! with tag/class/attribute data, inline styles, and host-supplied layout
//! boxes. Elements keep a parent link so structural queries (an image inside
//! a designated figure wrapper) work the same way they would against parsed
//! markup. Overlay elements are created detached and only join the rendered
//! tree via [`Document::attach`]; teardown removes them outright.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Stable handle to an element in the document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(u32);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// CSS `visibility` as far as the engine cares about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// CSS `object-fit` states the clone moves between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectFit {
    /// Cropped to fill its box, the thumbnail look.
    Cover,
    /// Letterboxed inside its box, the enlarged look.
    Contain,
}

/// CSS positioning scheme for overlay elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Static,
    Absolute,
    Fixed,
}

/// The handful of inline style properties the transition reads and writes.
///
/// Everything else an author stylesheet might set stays out of scope; the
/// engine replicates only corner radius and shadow from the source image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub position: Position,
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub opacity: Option<f64>,
    pub visibility: Visibility,
    pub object_fit: Option<ObjectFit>,
    pub border_radius: Option<String>,
    pub box_shadow: Option<String>,
    pub z_index: Option<i32>,
    pub transition: Option<String>,
    pub cursor: Option<String>,
    pub background: Option<String>,
    pub margin: Option<String>,
    pub box_sizing: Option<String>,
    pub pointer_events_none: bool,
}

impl Style {
    /// Write a document-coordinate rect into position/size properties.
    pub fn set_rect(&mut self, rect: Rect) {
        self.left = Some(rect.left);
        self.top = Some(rect.top);
        self.width = Some(rect.width);
        self.height = Some(rect.height);
    }

    /// Read the position/size properties back as a rect, if all are set.
    pub fn rect(&self) -> Option<Rect> {
        Some(Rect::new(self.left?, self.top?, self.width?, self.height?))
    }
}

/// One node in the arena.
#[derive(Debug, Clone)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    pub attrs: HashMap<String, String>,
    pub style: Style,
    /// Viewport-relative rendered box, host- or layout-supplied. `None` for
    /// elements the host never laid out (e.g. a detached overlay).
    pub layout: Option<Rect>,
    pub parent: Option<ElementId>,
    attached: bool,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            classes: Vec::new(),
            attrs: HashMap::new(),
            style: Style::default(),
            layout: None,
            parent: None,
            attached: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Arena of elements with insertion-order iteration.
#[derive(Debug, Default)]
pub struct Document {
    nodes: HashMap<ElementId, Element>,
    order: Vec<ElementId>,
    next_id: u32,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached element and return its handle.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, Element::new(tag));
        self.order.push(id);
        id
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.nodes.get_mut(&id)
    }

    pub fn set_parent(&mut self, child: ElementId, parent: ElementId) {
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
    }

    /// Join the rendered tree (the `appendChild` analogue).
    pub fn attach(&mut self, id: ElementId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.attached = true;
        }
    }

    /// Remove the element from the document entirely (the `remove()`
    /// analogue). Missing ids are tolerated; teardown paths must be able to
    /// run independently of one another.
    pub fn remove(&mut self, id: ElementId) -> bool {
        if self.nodes.remove(&id).is_some() {
            self.order.retain(|e| *e != id);
            true
        } else {
            log::warn!("remove of unknown element {id} ignored");
            false
        }
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Elements in document order.
    pub fn iter(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.order.iter().filter_map(|id| Some((*id, self.nodes.get(id)?)))
    }

    /// Count attached elements carrying the given class.
    pub fn attached_with_class(&self, class: &str) -> usize {
        self.iter()
            .filter(|(_, e)| e.is_attached() && e.has_class(class))
            .count()
    }

    /// Walk the parent chain looking for a tag/class pair.
    pub fn has_ancestor(&self, id: ElementId, tag: &str, class: &str) -> bool {
        let mut cursor = self.get(id).and_then(|e| e.parent);
        while let Some(pid) = cursor {
            match self.get(pid) {
                Some(p) => {
                    if p.tag == tag && p.has_class(class) {
                        return true;
                    }
                    cursor = p.parent;
                }
                None => break,
            }
        }
        false
    }

    /// Images nested inside a `<figure class="...">` wrapper, in document
    /// order. This is the structural convention the page markup supplies.
    pub fn qualifying_images(&self, figure_class: &str) -> Vec<ElementId> {
        self.iter()
            .filter(|(id, e)| {
                e.tag == "img" && e.is_attached() && self.has_ancestor(*id, "figure", figure_class)
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Topmost attached element whose document-coordinate box contains the
    /// point, resolved by z-index then document order. Boxes come from the
    /// inline style rect for positioned overlays, else the layout box offset
    /// by scroll.
    pub fn hit_test(&self, x: f64, y: f64, scroll_x: f64, scroll_y: f64) -> Option<ElementId> {
        let mut best: Option<(i32, usize, ElementId)> = None;
        for (idx, (id, e)) in self.iter().enumerate() {
            if !e.is_attached() {
                continue;
            }
            // Hidden elements and pass-through overlays (the origin frame)
            // never receive pointer events.
            if e.style.visibility == Visibility::Hidden || e.style.pointer_events_none {
                continue;
            }
            let rect = match e.style.position {
                // Absolute boxes are already in document coordinates.
                Position::Absolute => e.style.rect(),
                // Fixed boxes are viewport-relative and ride along with the
                // scroll position.
                Position::Fixed => e
                    .style
                    .rect()
                    .map(|r| Rect::new(r.left + scroll_x, r.top + scroll_y, r.width, r.height)),
                Position::Static => e
                    .layout
                    .map(|r| Rect::new(r.left + scroll_x, r.top + scroll_y, r.width, r.height)),
            };
            let Some(rect) = rect else { continue };
            if !rect.contains(x, y) {
                continue;
            }
            let z = e.style.z_index.unwrap_or(0);
            match best {
                Some((bz, bidx, _)) if (z, idx) < (bz, bidx) => {}
                _ => best = Some((z, idx, id)),
            }
        }
        best.map(|(_, _, id)| id)
    }
}
