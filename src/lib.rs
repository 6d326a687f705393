//! Flipzoom Headless Modal Engine
//!
//! A headless engine for the click-to-enlarge image modal found on
//! figure-heavy pages: click a qualifying image and a clone of it animates
//! from its place in the page to a centered, enlarged box over a dimmed
//! backdrop; scroll, Escape, or a click sends it back where it came from.
//!
//! # Features
//!
//! - **FLIP transitions**: source and target rects are measured up front and
//!   the style commit is deferred one animation frame, so the declared
//!   transition plays instead of coalescing
//! - **Deterministic**: single-threaded event loop under virtual time;
//!   identical input scripts replay to identical timelines
//! - **Headless**: no browser required; hosts feed markup or build the
//!   document directly and step the clock themselves
//!
//! # Example
//!
//! ```
//! use flipzoom::{EngineConfig, Rect, SessionState, ZoomEngine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut engine = ZoomEngine::new(EngineConfig::default())?;
//! let image = engine.insert_figure_image(Rect::new(100.0, 200.0, 300.0, 200.0));
//! engine.initialize()?;
//!
//! engine.dispatch_click(image)?;
//! engine.run_until_idle();
//! assert_eq!(engine.session_state(), Some(SessionState::Open));
//!
//! engine.dispatch_scroll(0.0, 120.0)?;
//! engine.run_until_idle();
//! assert_eq!(engine.session_state(), None);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod dom;
pub mod elements;
pub mod engine;
pub mod events;
pub mod geometry;
pub mod scheduler;
pub mod session;
pub mod triggers;

mod animation;
mod lifecycle;

// HTML loading backend (scraper-based document seeding)
#[cfg(feature = "html")]
mod html;

pub use engine::{OverlaySnapshot, OverlayView, TimelineEvent, TimelineEventKind, ZoomEngine};
pub use events::Key;
pub use geometry::Rect;
pub use session::SessionState;
pub use triggers::CloseTrigger;

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Window state the engine measures against: viewport plus scroll offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub viewport: Viewport,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Window {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

/// Configuration for the zoom-modal engine
///
/// Defaults reproduce the reference interaction: the enlarged box fills at
/// most 80% of each viewport axis, transitions run 350ms, and close triggers
/// arm 10ms after the open commit so the originating click cannot close the
/// session it just opened.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Initial viewport dimensions
    pub viewport: Viewport,
    /// Fraction of each viewport axis the enlarged image may occupy
    pub bounds_fraction: f64,
    /// Open and close transition duration in milliseconds (always equal)
    pub transition_ms: u64,
    /// Delay before close triggers arm, in milliseconds
    pub arm_delay_ms: u64,
    /// Opacity the origin frame fades to while the modal is open
    pub frame_opacity: f64,
    /// Corner radius applied to the clone at the enlarged target
    pub enlarged_radius: String,
    /// Shadow applied to the clone at the enlarged target
    pub enlarged_shadow: String,
    /// Class a `<figure>` wrapper must carry for its images to qualify
    pub figure_class: String,
    /// Class stamped on the backdrop element
    pub backdrop_class: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            bounds_fraction: 0.8,
            transition_ms: 350,
            arm_delay_ms: 10,
            frame_opacity: 0.2,
            enlarged_radius: "5px".to_string(),
            enlarged_shadow: "0 0.2em 1.2em #00000055".to_string(),
            figure_class: "image".to_string(),
            backdrop_class: "image-modal-backdrop".to_string(),
        }
    }
}

impl EngineConfig {
    /// Reject configurations the transition math cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.transition_ms == 0 {
            return Err(Error::ConfigError(
                "transition duration must be positive".to_string(),
            ));
        }
        if !(self.bounds_fraction > 0.0 && self.bounds_fraction <= 1.0) {
            return Err(Error::ConfigError(format!(
                "bounds fraction must be in (0, 1], got {}",
                self.bounds_fraction
            )));
        }
        if !(0.0..=1.0).contains(&self.frame_opacity) {
            return Err(Error::ConfigError(format!(
                "frame opacity must be in [0, 1], got {}",
                self.frame_opacity
            )));
        }
        if self.arm_delay_ms >= self.transition_ms {
            log::warn!(
                "arm delay ({}ms) is not well under the transition duration ({}ms)",
                self.arm_delay_ms,
                self.transition_ms
            );
        }
        Ok(())
    }
}

/// Create an engine with the given configuration. Convenience alias for
/// [`ZoomEngine::new`].
pub fn new_engine(config: EngineConfig) -> Result<ZoomEngine> {
    ZoomEngine::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.viewport.width, 1280);
        assert_eq!(config.viewport.height, 720);
        assert_eq!(config.transition_ms, 350);
        assert_eq!(config.arm_delay_ms, 10);
        assert!((config.bounds_fraction - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn validate_rejects_zero_duration() {
        let config = EngineConfig {
            transition_ms: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
    }

    #[test]
    fn validate_rejects_out_of_range_fractions() {
        for bounds_fraction in [0.0, -0.5, 1.5] {
            let config = EngineConfig {
                bounds_fraction,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(Error::ConfigError(_))));
        }
    }
}
