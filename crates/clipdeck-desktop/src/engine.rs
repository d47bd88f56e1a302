//! GStreamer Engine - `MediaEngine` over `gstreamer_player`
//!
//! Signal mapping:
//! - `state-changed`: buffering, paused and playing become time control changes
//! - `uri-loaded`: marks the current item as the one end-of-stream refers to
//! - `end-of-stream`: applies the end action, then notifies the loaded item's observers
//! - `error`: stored on the current item (or the player), then reported as `Failed`;
//!   errors raised for an already replaced item are dropped
//! - `warning`: appended to the current item's error log

use anyhow::{Context, Result};
use clipdeck_core::{
    engine::{ItemEndHandler, StatusHandler, TimeControlHandler},
    ActionAtItemEnd, EngineError, ErrorLogEvent, ItemId, MediaEngine, ObserverRegistry,
    ObserverToken, PlayerStatus, TimeControlStatus,
};
use gstreamer as gst;
use gstreamer::glib;
use gstreamer::glib::error::ErrorDomain;
use gstreamer::prelude::*;
use gstreamer_player as gst_player;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};
use url::Url;

#[derive(Debug, Default)]
struct EngineState {
    next_item: u64,
    current_item: Option<ItemId>,
    current_uri: Option<Url>,
    /// Item whose URI the player has actually loaded
    loaded_item: Option<ItemId>,
    action_at_item_end: Option<ActionAtItemEnd>,
    item_error: Option<EngineError>,
    player_error: Option<EngineError>,
    error_log: Vec<ErrorLogEvent>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<EngineState>,
    observers: ObserverRegistry,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify_time_control(&self, status: TimeControlStatus) {
        for handler in self.observers.time_control_handlers() {
            handler(status);
        }
    }

    fn notify_status(&self, status: PlayerStatus) {
        for handler in self.observers.status_handlers() {
            handler(status);
        }
    }

    fn notify_item_end(&self, item: ItemId) {
        for handler in self.observers.item_end_handlers(item) {
            handler();
        }
    }
}

/// Where a player error belongs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorTarget {
    /// The current item, once its URI is loaded
    Item,
    /// No item yet
    Player,
    /// Raised for an item that was already replaced
    Stale,
}

impl EngineState {
    fn error_target(&self) -> ErrorTarget {
        match (self.current_item, self.loaded_item) {
            (None, _) => ErrorTarget::Player,
            (Some(current), Some(loaded)) if current == loaded => ErrorTarget::Item,
            // uri-loaded precedes any error for the new URI
            (Some(_), _) => ErrorTarget::Stale,
        }
    }
}

/// Map a player state onto the engine time control status
fn time_control(state: gst_player::PlayerState) -> Option<TimeControlStatus> {
    match state {
        gst_player::PlayerState::Buffering => Some(TimeControlStatus::WaitingToPlayAtSpecifiedRate),
        gst_player::PlayerState::Paused => Some(TimeControlStatus::Paused),
        gst_player::PlayerState::Playing => Some(TimeControlStatus::Playing),
        _ => None,
    }
}

/// Domain and numeric code of a GStreamer error
fn engine_error(err: &glib::Error) -> EngineError {
    let code = err
        .kind::<gst::ResourceError>()
        .map(|e| e.code())
        .or_else(|| err.kind::<gst::StreamError>().map(|e| e.code()))
        .or_else(|| err.kind::<gst::CoreError>().map(|e| e.code()))
        .or_else(|| err.kind::<gst::LibraryError>().map(|e| e.code()))
        .unwrap_or(-1);

    EngineError::new(err.domain().as_str().to_string(), i64::from(code))
}

/// GStreamer-based media engine
pub struct GstEngine {
    player: gst_player::Player,
    shared: Arc<Shared>,
    signals: Mutex<Vec<glib::SignalHandlerId>>,
}

impl GstEngine {
    /// Initialize GStreamer and create a player without a video sink window
    pub fn new() -> Result<Self> {
        gst::init().context("Failed to initialize GStreamer")?;

        let player = gst_player::Player::new(
            None::<gst_player::PlayerVideoRenderer>,
            None::<gst_player::PlayerSignalDispatcher>,
        );
        let shared = Arc::new(Shared::default());
        let mut signals = Vec::new();

        let s = shared.clone();
        signals.push(player.connect_state_changed(move |_player, gst_state| {
            debug!("Player state changed: {:?}", gst_state);
            if let Some(status) = time_control(gst_state) {
                s.notify_time_control(status);
            }
        }));

        let s = shared.clone();
        signals.push(player.connect_uri_loaded(move |_player, uri| {
            let mut state = s.state();
            if state.current_uri.as_ref().map(Url::as_str) == Some(uri) {
                state.loaded_item = state.current_item;
                debug!(uri, "URI loaded");
            }
        }));

        let s = shared.clone();
        signals.push(player.connect_end_of_stream(move |player| {
            let (item, action) = {
                let state = s.state();
                (state.loaded_item, state.action_at_item_end)
            };
            match action {
                Some(ActionAtItemEnd::Pause) => player.pause(),
                Some(ActionAtItemEnd::Advance) => player.stop(),
                Some(ActionAtItemEnd::None) | None => {}
            }
            match item {
                Some(item) => {
                    info!(item = %item, "End of stream");
                    s.notify_item_end(item);
                }
                None => debug!("End of stream before the current item loaded"),
            }
        }));

        let s = shared.clone();
        signals.push(player.connect_error(move |_player, err| {
            let target = {
                let mut state = s.state();
                let target = state.error_target();
                let detail = engine_error(err);
                match target {
                    ErrorTarget::Item => state.item_error = Some(detail),
                    ErrorTarget::Player => state.player_error = Some(detail),
                    ErrorTarget::Stale => {}
                }
                target
            };
            if target == ErrorTarget::Stale {
                debug!("Dropping error raised for a replaced item: {}", err);
                return;
            }
            error!("Player error: {}", err);
            s.notify_status(PlayerStatus::Failed);
        }));

        let s = shared.clone();
        signals.push(player.connect_warning(move |_player, warning| {
            warn!("Player warning: {}", warning);
            let mut state = s.state();
            let detail = engine_error(warning);
            let mut event = ErrorLogEvent::new(detail.domain, detail.code)
                .with_comment(warning.message().to_string());
            event.uri = state.current_uri.as_ref().map(Url::to_string);
            state.error_log.push(event);
        }));

        info!("GStreamer engine ready");

        Ok(Self {
            player,
            shared,
            signals: Mutex::new(signals),
        })
    }

    /// Number of live observer registrations
    pub fn observer_count(&self) -> usize {
        self.shared.observers.len()
    }
}

impl MediaEngine for GstEngine {
    fn replace_current_item(&self, source: &Url) -> clipdeck_core::Result<ItemId> {
        let item = {
            let mut state = self.shared.state();
            state.next_item += 1;
            let item = ItemId(state.next_item);
            state.current_item = Some(item);
            state.current_uri = Some(source.clone());
            state.loaded_item = None;
            state.item_error = None;
            state.error_log.clear();
            item
        };

        info!(item = %item, uri = %source, "Loading");
        self.player.set_uri(Some(source.as_str()));
        Ok(item)
    }

    fn current_item(&self) -> Option<ItemId> {
        self.shared.state().current_item
    }

    fn play(&self) {
        self.player.play();
    }

    fn pause(&self) {
        self.player.pause();
    }

    fn set_action_at_item_end(&self, action: ActionAtItemEnd) {
        self.shared.state().action_at_item_end = Some(action);
    }

    fn observe_time_control(&self, handler: TimeControlHandler) -> clipdeck_core::Result<ObserverToken> {
        Ok(self.shared.observers.add_time_control(handler))
    }

    fn observe_status(&self, handler: StatusHandler) -> clipdeck_core::Result<ObserverToken> {
        Ok(self.shared.observers.add_status(handler))
    }

    fn observe_item_end(
        &self,
        item: ItemId,
        handler: ItemEndHandler,
    ) -> clipdeck_core::Result<ObserverToken> {
        Ok(self.shared.observers.add_item_end(item, handler))
    }

    fn remove_observer(&self, token: ObserverToken) {
        self.shared.observers.remove(token);
    }

    fn item_error(&self) -> clipdeck_core::Result<Option<EngineError>> {
        Ok(self.shared.state().item_error.clone())
    }

    fn player_error(&self) -> clipdeck_core::Result<Option<EngineError>> {
        Ok(self.shared.state().player_error.clone())
    }

    fn item_error_log(&self) -> clipdeck_core::Result<Vec<ErrorLogEvent>> {
        Ok(self.shared.state().error_log.clone())
    }
}

impl Drop for GstEngine {
    fn drop(&mut self) {
        self.player.stop();
        let signals = std::mem::take(&mut *self.signals.lock().unwrap_or_else(|e| e.into_inner()));
        for id in signals {
            self.player.disconnect(id);
        }
    }
}

/// Check GStreamer installation and the elements clip playback needs
pub fn check_installation() -> Result<GStreamerInfo> {
    gst::init().context("Failed to initialize GStreamer")?;

    let (major, minor, micro, nano) = gst::version();
    let version = format!("{}.{}.{}.{}", major, minor, micro, nano);

    let required_elements = [
        ("playbin", "Core playback"),
        ("souphttpsrc", "HTTPS sources"),
        ("qtdemux", "MP4 demuxing"),
        ("decodebin", "Auto decoding"),
    ];

    let missing_elements = required_elements
        .iter()
        .filter(|(element, _)| gst::ElementFactory::find(element).is_none())
        .map(|(element, desc)| format!("{} ({})", element, desc))
        .collect();

    Ok(GStreamerInfo {
        version,
        missing_elements,
    })
}

/// GStreamer installation information
#[derive(Debug)]
pub struct GStreamerInfo {
    pub version: String,
    pub missing_elements: Vec<String>,
}

impl GStreamerInfo {
    pub fn is_complete(&self) -> bool {
        self.missing_elements.is_empty()
    }
}
