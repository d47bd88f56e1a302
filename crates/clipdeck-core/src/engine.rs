//! Media engine seam
//!
//! The engine that decodes and renders frames lives outside this crate.
//! [`MediaEngine`] captures the part of its API the player core consumes:
//! - load-by-URI, play and pause commands
//! - an observable time control status
//! - an observable player status (only `Failed` matters here)
//! - an end-of-item notification keyed to one loaded item
//! - the three error sources read when a failure fires
//! - the action taken when an item ends
//!
//! Observers are registered per handle and removed through the returned
//! [`ObserverToken`]. [`Subscription`] owns a set of tokens and removes them
//! on cancel or drop.

use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use url::Url;

/// Engine-side playback rate status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeControlStatus {
    Paused,
    WaitingToPlayAtSpecifiedRate,
    Playing,
}

/// Engine-side readiness status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Unknown,
    ReadyToPlay,
    Failed,
}

/// What the engine does when the current item plays to its end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionAtItemEnd {
    /// Move on to the next queued item
    Advance,
    /// Stay on the last frame, paused
    Pause,
    /// Keep the rate unchanged
    None,
}

/// Identifies one item loaded into an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// Identifies one observer registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverToken(pub u64);

/// Error object exposed by the engine or by its current item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineError {
    pub domain: String,
    pub code: i64,
}

impl EngineError {
    pub fn new(domain: impl Into<String>, code: i64) -> Self {
        Self {
            domain: domain.into(),
            code,
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.domain, self.code)
    }
}

/// Entry of the current item's accumulated error log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLogEvent {
    pub domain: String,
    pub status_code: i64,
    pub date: DateTime<Utc>,
    pub uri: Option<String>,
    pub comment: Option<String>,
}

impl ErrorLogEvent {
    pub fn new(domain: impl Into<String>, status_code: i64) -> Self {
        Self {
            domain: domain.into(),
            status_code,
            date: Utc::now(),
            uri: None,
            comment: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

impl std::fmt::Display for ErrorLogEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.domain, self.status_code)
    }
}

/// Callback for time control changes
pub type TimeControlHandler = Box<dyn Fn(TimeControlStatus) + Send + Sync>;
/// Callback for player status changes
pub type StatusHandler = Box<dyn Fn(PlayerStatus) + Send + Sync>;
/// Callback for end-of-item notifications
pub type ItemEndHandler = Box<dyn Fn() + Send + Sync>;

/// Shared form of [`TimeControlHandler`]
pub type SharedTimeControlHandler = Arc<dyn Fn(TimeControlStatus) + Send + Sync>;
/// Shared form of [`StatusHandler`]
pub type SharedStatusHandler = Arc<dyn Fn(PlayerStatus) + Send + Sync>;
/// Shared form of [`ItemEndHandler`]
pub type SharedItemEndHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Observers {
    next_token: u64,
    time_control: BTreeMap<ObserverToken, SharedTimeControlHandler>,
    status: BTreeMap<ObserverToken, SharedStatusHandler>,
    item_end: BTreeMap<ObserverToken, (ItemId, SharedItemEndHandler)>,
}

impl Observers {
    fn token(&mut self) -> ObserverToken {
        self.next_token += 1;
        ObserverToken(self.next_token)
    }
}

/// Observer bookkeeping for engine implementations.
///
/// Handler snapshots are cloned out of the lock, so engines can invoke
/// them without holding it.
#[derive(Default)]
pub struct ObserverRegistry {
    inner: Mutex<Observers>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Observers> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn add_time_control(&self, handler: TimeControlHandler) -> ObserverToken {
        let mut observers = self.lock();
        let token = observers.token();
        observers.time_control.insert(token, Arc::from(handler));
        token
    }

    pub fn add_status(&self, handler: StatusHandler) -> ObserverToken {
        let mut observers = self.lock();
        let token = observers.token();
        observers.status.insert(token, Arc::from(handler));
        token
    }

    pub fn add_item_end(&self, item: ItemId, handler: ItemEndHandler) -> ObserverToken {
        let mut observers = self.lock();
        let token = observers.token();
        observers.item_end.insert(token, (item, Arc::from(handler)));
        token
    }

    pub fn remove(&self, token: ObserverToken) {
        let mut observers = self.lock();
        observers.time_control.remove(&token);
        observers.status.remove(&token);
        observers.item_end.remove(&token);
    }

    pub fn time_control_handlers(&self) -> Vec<SharedTimeControlHandler> {
        self.lock().time_control.values().cloned().collect()
    }

    pub fn status_handlers(&self) -> Vec<SharedStatusHandler> {
        self.lock().status.values().cloned().collect()
    }

    /// End-of-item handlers registered for `item` only
    pub fn item_end_handlers(&self, item: ItemId) -> Vec<SharedItemEndHandler> {
        self.lock()
            .item_end
            .values()
            .filter(|(id, _)| *id == item)
            .map(|(_, handler)| handler.clone())
            .collect()
    }

    /// Number of live registrations of every kind
    pub fn len(&self) -> usize {
        let observers = self.lock();
        observers.time_control.len() + observers.status.len() + observers.item_end.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Underlying media engine
///
/// Handlers may be invoked from any thread and must not block. Engines
/// must not hold internal locks while invoking them.
pub trait MediaEngine: Send + Sync + 'static {
    /// Replace the current item with one loaded from `source`
    fn replace_current_item(&self, source: &Url) -> Result<ItemId>;

    /// Item currently loaded, if any
    fn current_item(&self) -> Option<ItemId>;

    fn play(&self);

    fn pause(&self);

    fn set_action_at_item_end(&self, action: ActionAtItemEnd);

    fn observe_time_control(&self, handler: TimeControlHandler) -> Result<ObserverToken>;

    fn observe_status(&self, handler: StatusHandler) -> Result<ObserverToken>;

    /// Observe the end of `item` only
    fn observe_item_end(&self, item: ItemId, handler: ItemEndHandler) -> Result<ObserverToken>;

    /// Remove an observer. Unknown tokens are ignored.
    fn remove_observer(&self, token: ObserverToken);

    /// Error object of the current item
    fn item_error(&self) -> Result<Option<EngineError>>;

    /// Player-level error object
    fn player_error(&self) -> Result<Option<EngineError>>;

    /// Accumulated error log of the current item, oldest first
    fn item_error_log(&self) -> Result<Vec<ErrorLogEvent>>;
}

/// Find the message describing a failure.
///
/// Sources are checked in priority order and the first hit wins:
/// the current item's error, the player error, then the first entry of the
/// item's error log. Returns `Ok(None)` when no source has anything.
pub fn extract_error(engine: &dyn MediaEngine) -> Result<Option<String>> {
    if let Some(err) = engine.item_error()? {
        return Ok(Some(err.to_string()));
    }

    if let Some(err) = engine.player_error()? {
        return Ok(Some(err.to_string()));
    }

    Ok(engine
        .item_error_log()?
        .into_iter()
        .next()
        .map(|event| event.to_string()))
}

/// Observer registrations owned by one player session
pub struct Subscription {
    engine: Arc<dyn MediaEngine>,
    tokens: Vec<ObserverToken>,
    active: Arc<AtomicBool>,
}

impl Subscription {
    pub fn new(engine: Arc<dyn MediaEngine>) -> Self {
        Self {
            engine,
            tokens: Vec::new(),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Flag shared with the adapter callbacks; cleared on cancel.
    pub fn active_flag(&self) -> Arc<AtomicBool> {
        self.active.clone()
    }

    pub fn push(&mut self, token: ObserverToken) {
        self.tokens.push(token);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Silence the callbacks and remove every observer from the engine
    pub fn cancel(&mut self) {
        self.active.store(false, Ordering::Release);
        if self.tokens.is_empty() {
            return;
        }
        debug!(observers = self.tokens.len(), "Releasing engine observers");
        for token in self.tokens.drain(..) {
            self.engine.remove_observer(token);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("tokens", &self.tokens)
            .field("active", &self.is_active())
            .finish()
    }
}
