//! ClipDeck Core - Clip Player Library
//!
//! This crate provides the playback core behind the clip picker screen:
//! - Static catalog of selectable clips
//! - Media engine seam with handle-scoped observer subscriptions
//! - Pure reducer folding engine signals into one playback state
//! - Single-consumer state machine publishing that state
//! - Playback controller handling load, play and clip switches
//! - Framework-free view model for the picker and play overlay
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        ClipDeck Core                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐  select / tap   ┌──────────────┐              │
//! │  │  View Model  │ ──────────────▶ │   Playback   │              │
//! │  │  + Catalog   │                 │  Controller  │              │
//! │  └──────▲───────┘                 └──────┬───────┘              │
//! │         │ watch                          │ load / attach        │
//! │  ┌──────┴───────┐   mpsc envelopes ┌─────┴────────┐             │
//! │  │ State Machine│ ◀─────────────── │ Media Engine │             │
//! │  │  (reducer)   │   (generation)   │ Subscription │             │
//! │  └──────────────┘                  └──────────────┘             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod catalog;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod observer;
pub mod reducer;
pub mod session;
pub mod sim;
pub mod types;
pub mod view;

pub use catalog::Catalog;
pub use config::PlayerConfig;
pub use controller::PlaybackController;
pub use engine::{
    extract_error, ActionAtItemEnd, EngineError, ErrorLogEvent, ItemId, MediaEngine,
    ObserverRegistry, ObserverToken, PlayerStatus, Subscription, TimeControlStatus,
};
pub use error::{Error, Result, ERROR_DOMAIN};
pub use observer::{Envelope, PlayerStateMachine, StateCore};
pub use reducer::{reduce, PlayerEvent, Transition};
pub use session::PlayerSession;
pub use sim::{EngineCommand, SimulatedEngine};
pub use types::*;
pub use view::{PlayerView, Segment};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the player library
pub fn init() {
    tracing::info!(version = VERSION, "ClipDeck Core initialized");
}
