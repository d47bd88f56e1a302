//! Headless desktop runner
//!
//! Plays the reference catalog front to back. A clip that ends or fails
//! moves the selection to the next one; the runner exits after the last
//! clip or on Ctrl-C.

use anyhow::Result;
use clipdeck_core::{Catalog, PlaybackState, PlayerConfig, PlayerView};
use clipdeck_desktop::{check_installation, GstEngine};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    clipdeck_core::init();

    let info = check_installation()?;
    info!(version = %info.version, "GStreamer detected");
    if !info.is_complete() {
        warn!(missing = ?info.missing_elements, "GStreamer installation is incomplete");
    }

    let engine = Arc::new(GstEngine::new()?);
    let catalog = Catalog::reference();
    let mut view = PlayerView::new(catalog, engine, PlayerConfig::default())?;

    for segment in view.segments() {
        info!(title = %segment.title, icon = %segment.icon, selected = segment.selected, "Segment");
    }

    view.tap_play();

    loop {
        let state = tokio::select! {
            state = view.changed() => state?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        };

        let finished = match &state {
            PlaybackState::ReachedEnd => true,
            PlaybackState::Error(message) => {
                error!(%message, "Clip failed");
                true
            }
            _ => false,
        };
        if !finished {
            continue;
        }

        let next = view.selected_index() + 1;
        if next >= view.catalog().len() {
            info!("Catalog finished");
            break;
        }
        view.select(next)?;
    }

    Ok(())
}
