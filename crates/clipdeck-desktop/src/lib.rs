//! ClipDeck Desktop - GStreamer Engine
//!
//! Native engine behind the clip picker with:
//! - HTTPS progressive MP4 playback through `gstreamer_player`
//! - Engine signals mapped onto the `MediaEngine` observer API
//! - Error and warning capture for the core's error extraction
//!
//! # Example
//!
//! ```rust,no_run
//! use clipdeck_core::{Catalog, PlayerConfig, PlayerView};
//! use clipdeck_desktop::GstEngine;
//! use std::sync::Arc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let engine = Arc::new(GstEngine::new()?);
//! let mut view = PlayerView::new(Catalog::reference(), engine, PlayerConfig::default())?;
//! view.tap_play();
//! # Ok(())
//! # }
//! ```

pub mod engine;

pub use engine::{check_installation, GStreamerInfo, GstEngine};
