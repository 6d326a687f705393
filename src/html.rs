//! HTML loading backend (feature `html`).
//!
//! Seeds the document arena from static markup: every image inside a
//! qualifying figure wrapper becomes an arena element carrying its
//! attributes and the couple of inline style properties the transition
//! replicates. Markup has no rendered geometry, so a basic block layout
//! stacks the figures down the page; hosts with real layout information can
//! overwrite the boxes afterwards.

use scraper::{Html, Selector};

use crate::dom::Style;
use crate::engine::ZoomEngine;
use crate::error::{Error, Result};
use crate::geometry::Rect;

const PAGE_MARGIN: f64 = 8.0;
const DEFAULT_IMAGE_WIDTH: f64 = 640.0;
const DEFAULT_IMAGE_HEIGHT: f64 = 480.0;

impl ZoomEngine {
    /// Load markup, replacing any previous document. Page state (document,
    /// listeners, active session, initialization flag) resets the way a
    /// navigation would; the clock and timeline carry on.
    pub fn load_html(&mut self, html: &str) -> Result<()> {
        let parsed = Html::parse_document(html);
        let selector = Selector::parse(&format!("figure.{} img", self.config.figure_class))
            .map_err(|e| {
                Error::ConfigError(format!(
                    "figure class {:?} does not form a valid selector: {e:?}",
                    self.config.figure_class
                ))
            })?;

        self.doc = crate::dom::Document::new();
        self.listeners = crate::events::ListenerRegistry::new();
        self.session = None;
        self.initialized = false;

        let figure_class = self.config.figure_class.clone();
        let page_width = self.window.viewport.width as f64;
        let mut y = PAGE_MARGIN;

        for node in parsed.select(&selector) {
            let figure = self.doc.create_element("figure");
            if let Some(f) = self.doc.get_mut(figure) {
                f.classes.push(figure_class.clone());
            }
            self.doc.attach(figure);

            let img = self.doc.create_element("img");
            let layout = {
                let element = self.doc.get_mut(img).expect("freshly created element");
                for (name, value) in node.value().attrs() {
                    element.attrs.insert(name.to_string(), value.to_string());
                }
                if let Some(style_attr) = node.value().attr("style") {
                    apply_inline_style(&mut element.style, style_attr);
                }

                // Natural size from width/height attributes, scaled down to
                // fit the content column.
                let natural_w = attr_px(element.attrs.get("width")).unwrap_or(DEFAULT_IMAGE_WIDTH);
                let natural_h = attr_px(element.attrs.get("height")).unwrap_or(DEFAULT_IMAGE_HEIGHT);
                let max_w = (page_width - 2.0 * PAGE_MARGIN).max(1.0);
                let scale = if natural_w > max_w { max_w / natural_w } else { 1.0 };
                Rect::new(PAGE_MARGIN, y, natural_w * scale, natural_h * scale)
            };
            if let Some(element) = self.doc.get_mut(img) {
                element.layout = Some(layout);
            }
            self.doc.set_parent(img, figure);
            self.doc.attach(img);

            y += layout.height + PAGE_MARGIN;
        }

        log::debug!(
            "loaded document with {} qualifying image(s)",
            self.doc.qualifying_images(&self.config.figure_class).len()
        );
        Ok(())
    }
}

fn attr_px(value: Option<&String>) -> Option<f64> {
    let parsed: f64 = value?.trim().parse().ok()?;
    (parsed.is_finite() && parsed > 0.0).then_some(parsed)
}

/// Pick the replicated properties out of a `style` attribute. Anything else
/// an author wrote is outside the style contract and ignored.
fn apply_inline_style(style: &mut Style, attr: &str) {
    for decl in attr.split(';') {
        let Some((name, value)) = decl.split_once(':') else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match name.trim().to_ascii_lowercase().as_str() {
            "border-radius" => style.border_radius = Some(value.to_string()),
            "box-shadow" => style.box_shadow = Some(value.to_string()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineConfig;

    const PAGE: &str = r#"<!DOCTYPE html>
<html><body>
<figure class="image">
  <img src="/a.jpg" width="300" height="200" style="border-radius: 8px; box-shadow: 0 1px 4px #0003">
</figure>
<p>prose between figures</p>
<figure class="image"><img src="/b.jpg" width="2000" height="1000"></figure>
<figure><img src="/not-qualifying.jpg"></figure>
</body></html>"#;

    #[test]
    fn load_html_seeds_qualifying_images_only() {
        let mut engine = ZoomEngine::new(EngineConfig::default()).unwrap();
        engine.load_html(PAGE).unwrap();
        let images = engine.document().qualifying_images("image");
        assert_eq!(images.len(), 2);

        let first = engine.document().get(images[0]).unwrap();
        assert_eq!(first.attrs.get("src").map(String::as_str), Some("/a.jpg"));
        assert_eq!(first.style.border_radius.as_deref(), Some("8px"));
        assert_eq!(first.style.box_shadow.as_deref(), Some("0 1px 4px #0003"));
        assert_eq!(first.layout.unwrap().width, 300.0);
        assert_eq!(first.layout.unwrap().height, 200.0);
    }

    #[test]
    fn oversized_images_scale_to_the_content_column() {
        let mut engine = ZoomEngine::new(EngineConfig::default()).unwrap();
        engine.load_html(PAGE).unwrap();
        let images = engine.document().qualifying_images("image");
        let wide = engine.document().get(images[1]).unwrap().layout.unwrap();
        assert_eq!(wide.width, 1280.0 - 16.0);
        assert!((wide.aspect_ratio() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn figures_stack_down_the_page() {
        let mut engine = ZoomEngine::new(EngineConfig::default()).unwrap();
        engine.load_html(PAGE).unwrap();
        let images = engine.document().qualifying_images("image");
        let first = engine.document().get(images[0]).unwrap().layout.unwrap();
        let second = engine.document().get(images[1]).unwrap().layout.unwrap();
        assert!(second.top >= first.bottom());
    }

    #[test]
    fn reload_resets_page_state() {
        let mut engine = ZoomEngine::new(EngineConfig::default()).unwrap();
        engine.load_html(PAGE).unwrap();
        engine.initialize().unwrap();
        engine.load_html("<html><body></body></html>").unwrap();
        assert_eq!(engine.document().qualifying_images("image").len(), 0);
        // A reloaded page scans fresh.
        assert_eq!(engine.initialize().unwrap(), 0);
    }

    #[test]
    fn inline_style_parser_ignores_unreplicated_properties() {
        let mut style = Style::default();
        apply_inline_style(&mut style, "color: red; border-radius: 50%; width: 10px");
        assert_eq!(style.border_radius.as_deref(), Some("50%"));
        assert!(style.box_shadow.is_none());
        assert!(style.width.is_none());
    }
}
