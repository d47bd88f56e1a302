//! In-process media engine
//!
//! Plays nothing. Records the commands it receives and lets the caller
//! fire the signals a real engine would, which is enough to drive the
//! state machine and controller in tests and dry runs.

use crate::{
    engine::{
        ItemEndHandler, ObserverRegistry, SharedTimeControlHandler, StatusHandler,
        TimeControlHandler,
    },
    ActionAtItemEnd, EngineError, Error, ErrorLogEvent, ItemId, MediaEngine, ObserverToken,
    PlayerStatus, Result, TimeControlStatus,
};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use url::Url;

/// Command received by the simulated engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Load(Url),
    Play,
    Pause,
    SetActionAtItemEnd(ActionAtItemEnd),
}

#[derive(Default)]
struct SimState {
    next_item: u64,
    current_item: Option<ItemId>,
    current_uri: Option<Url>,
    action_at_item_end: Option<ActionAtItemEnd>,
    commands: Vec<EngineCommand>,
    item_error: Option<EngineError>,
    player_error: Option<EngineError>,
    error_log: Vec<ErrorLogEvent>,
    accessor_fault: Option<String>,
    accessor_panic: bool,
    load_fault: Option<String>,
    reject_observers: bool,
}

/// Scriptable [`MediaEngine`]
#[derive(Default)]
pub struct SimulatedEngine {
    state: Mutex<SimState>,
    observers: ObserverRegistry,
}

impl SimulatedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fire a time control change on every registered observer
    pub fn emit_time_control(&self, status: TimeControlStatus) {
        for handler in self.time_control_handlers() {
            handler(status);
        }
    }

    /// Fire a player status change on every registered observer
    pub fn emit_status(&self, status: PlayerStatus) {
        for handler in self.observers.status_handlers() {
            handler(status);
        }
    }

    /// Reach the end of the current item, applying the configured end action
    pub fn finish_current_item(&self) {
        let (item, action) = {
            let state = self.state();
            (state.current_item, state.action_at_item_end)
        };
        let Some(item) = item else {
            return;
        };

        if action == Some(ActionAtItemEnd::Pause) {
            self.emit_time_control(TimeControlStatus::Paused);
        }
        self.finish_item(item);
    }

    /// Fire end-of-item observers registered for `item`
    pub fn finish_item(&self, item: ItemId) {
        for handler in self.observers.item_end_handlers(item) {
            handler();
        }
    }

    /// Snapshot of the registered time control callbacks
    pub fn time_control_handlers(&self) -> Vec<SharedTimeControlHandler> {
        self.observers.time_control_handlers()
    }

    pub fn set_item_error(&self, error: Option<EngineError>) {
        self.state().item_error = error;
    }

    pub fn set_player_error(&self, error: Option<EngineError>) {
        self.state().player_error = error;
    }

    pub fn push_error_log(&self, event: ErrorLogEvent) {
        self.state().error_log.push(event);
    }

    /// Make every error accessor fail with `reason`
    pub fn fail_error_accessors(&self, reason: impl Into<String>) {
        self.state().accessor_fault = Some(reason.into());
    }

    /// Make every error accessor panic
    pub fn panic_error_accessors(&self) {
        self.state().accessor_panic = true;
    }

    /// Make the next `replace_current_item` fail with `reason`
    pub fn fail_next_load(&self, reason: impl Into<String>) {
        self.state().load_fault = Some(reason.into());
    }

    /// Refuse new observer registrations
    pub fn reject_observers(&self, reject: bool) {
        self.state().reject_observers = reject;
    }

    pub fn commands(&self) -> Vec<EngineCommand> {
        self.state().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state().commands.clear();
    }

    pub fn current_uri(&self) -> Option<Url> {
        self.state().current_uri.clone()
    }

    pub fn action_at_item_end(&self) -> Option<ActionAtItemEnd> {
        self.state().action_at_item_end
    }

    /// Number of live observer registrations of every kind
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    fn check_registration(&self) -> Result<()> {
        if self.state().reject_observers {
            return Err(Error::engine("observer registration refused"));
        }
        Ok(())
    }

    fn check_accessors(&self) -> Result<()> {
        if self.state().accessor_panic {
            panic!("simulated error accessor panic");
        }
        match &self.state().accessor_fault {
            Some(reason) => Err(Error::engine(reason.clone())),
            None => Ok(()),
        }
    }
}

impl MediaEngine for SimulatedEngine {
    fn replace_current_item(&self, source: &Url) -> Result<ItemId> {
        let mut state = self.state();
        if let Some(reason) = state.load_fault.take() {
            return Err(Error::Load {
                uri: source.to_string(),
                reason,
            });
        }

        state.next_item += 1;
        let item = ItemId(state.next_item);
        state.current_item = Some(item);
        state.current_uri = Some(source.clone());
        state.item_error = None;
        state.error_log.clear();
        state.commands.push(EngineCommand::Load(source.clone()));
        debug!(item = %item, uri = %source, "Simulated item loaded");
        Ok(item)
    }

    fn current_item(&self) -> Option<ItemId> {
        self.state().current_item
    }

    fn play(&self) {
        self.state().commands.push(EngineCommand::Play);
    }

    fn pause(&self) {
        self.state().commands.push(EngineCommand::Pause);
    }

    fn set_action_at_item_end(&self, action: ActionAtItemEnd) {
        let mut state = self.state();
        state.action_at_item_end = Some(action);
        state.commands.push(EngineCommand::SetActionAtItemEnd(action));
    }

    fn observe_time_control(&self, handler: TimeControlHandler) -> Result<ObserverToken> {
        self.check_registration()?;
        Ok(self.observers.add_time_control(handler))
    }

    fn observe_status(&self, handler: StatusHandler) -> Result<ObserverToken> {
        self.check_registration()?;
        Ok(self.observers.add_status(handler))
    }

    fn observe_item_end(&self, item: ItemId, handler: ItemEndHandler) -> Result<ObserverToken> {
        self.check_registration()?;
        Ok(self.observers.add_item_end(item, handler))
    }

    fn remove_observer(&self, token: ObserverToken) {
        self.observers.remove(token);
    }

    fn item_error(&self) -> Result<Option<EngineError>> {
        self.check_accessors()?;
        Ok(self.state().item_error.clone())
    }

    fn player_error(&self) -> Result<Option<EngineError>> {
        self.check_accessors()?;
        Ok(self.state().player_error.clone())
    }

    fn item_error_log(&self) -> Result<Vec<ErrorLogEvent>> {
        self.check_accessors()?;
        Ok(self.state().error_log.clone())
    }
}
