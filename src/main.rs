//! Demo driver: replay one open/close interaction against a real HTML page
//! and print what the engine did.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use flipzoom::{EngineConfig, Key, Viewport, ZoomEngine};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CloseVia {
    Scroll,
    Escape,
    Backdrop,
    Clone,
}

#[derive(Parser)]
#[command(
    name = "flipzoom",
    about = "Replay a zoom-modal interaction against an HTML page"
)]
struct Cli {
    /// HTML file to load
    page: PathBuf,

    /// Viewport as WIDTHxHEIGHT
    #[arg(long, default_value = "1280x720")]
    viewport: String,

    /// Index of the qualifying image to click (document order)
    #[arg(long, default_value_t = 0)]
    image: usize,

    /// Which trigger closes the modal
    #[arg(long, value_enum, default_value = "scroll")]
    close_via: CloseVia,

    /// Emit the timeline as JSON instead of plain text
    #[arg(long)]
    json: bool,
}

fn parse_viewport(s: &str) -> anyhow::Result<Viewport> {
    let (w, h) = s
        .split_once('x')
        .with_context(|| format!("viewport must look like 1280x720, got {s}"))?;
    Ok(Viewport {
        width: w.trim().parse().context("viewport width")?,
        height: h.trim().parse().context("viewport height")?,
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let html = std::fs::read_to_string(&cli.page)
        .with_context(|| format!("failed to read {}", cli.page.display()))?;

    let config = EngineConfig {
        viewport: parse_viewport(&cli.viewport)?,
        ..Default::default()
    };
    let mut engine = ZoomEngine::new(config)?;
    engine.load_html(&html)?;

    let bound = engine.initialize()?;
    if bound == 0 {
        println!("no qualifying images in {}", cli.page.display());
        return Ok(());
    }

    let images = engine
        .document()
        .qualifying_images(&engine.config().figure_class);
    let target = images.get(cli.image).copied().with_context(|| {
        format!(
            "image index {} out of range ({} qualifying image(s))",
            cli.image,
            images.len()
        )
    })?;

    engine.dispatch_click(target)?;
    engine.run_until_idle();

    let open = engine.overlay_snapshot();
    if let Some(rect) = open.clone.as_ref().and_then(|c| c.rect) {
        println!(
            "enlarged {} to {:.0}x{:.0} at ({:.1}, {:.1})",
            target, rect.width, rect.height, rect.left, rect.top
        );
    }

    let viewport = engine.window().viewport;
    match cli.close_via {
        CloseVia::Scroll => engine.dispatch_scroll(0.0, 120.0)?,
        CloseVia::Escape => engine.dispatch_key(&Key::Escape)?,
        // Top-left corner is backdrop; the clone never reaches it.
        CloseVia::Backdrop => engine.dispatch_click_at(1.0, 1.0)?,
        CloseVia::Clone => engine.dispatch_click_at(
            viewport.width as f64 / 2.0,
            viewport.height as f64 / 2.0,
        )?,
    }
    engine.run_until_idle();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(engine.timeline())?);
    } else {
        for event in engine.timeline() {
            println!("[{:>4}ms] {:?}", event.t, event.kind);
        }
    }
    println!("timeline digest: {}", engine.timeline_digest()?);
    Ok(())
}
