//! Playback Controller - binds the selected clip to the engine
//!
//! Coordinates:
//! - Stopping the running clip
//! - Loading the new source into the engine
//! - Replacing the session and its observers
//! - Starting playback

use crate::{
    engine::MediaEngine, observer::PlayerStateMachine, session::PlayerSession, ActionAtItemEnd,
    Error, MediaItem, PlaybackState, PlayerConfig, Result,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};

/// Owns the engine and the single live session of one view
pub struct PlaybackController<E: MediaEngine> {
    engine: Arc<E>,
    machine: PlayerStateMachine,
    config: PlayerConfig,
    session: Option<PlayerSession>,
}

impl<E: MediaEngine> PlaybackController<E> {
    /// Create a controller and start its state machine on the current runtime
    pub fn new(engine: Arc<E>, config: PlayerConfig) -> Self {
        let machine = PlayerStateMachine::spawn(&config);
        Self::with_state_machine(engine, machine, config)
    }

    pub fn with_state_machine(engine: Arc<E>, machine: PlayerStateMachine, config: PlayerConfig) -> Self {
        Self {
            engine,
            machine,
            config,
            session: None,
        }
    }

    /// Load `item` into the engine and start playing it.
    ///
    /// Once this returns only the new session's observers can reach the
    /// state machine. Failures never surface here: they end up in the
    /// published state.
    #[instrument(skip(self, item), fields(item = %item.title))]
    pub fn load_and_play(&mut self, item: &MediaItem) {
        self.engine.pause();

        if let Some(session) = self.session.take() {
            session.close();
        }

        let generation = self.machine.generation();
        match self.start_session(item) {
            Ok(session) => {
                info!(
                    session_id = %session.id(),
                    uri = %item.source_uri,
                    generation = session.generation(),
                    "Loading clip"
                );
                self.session = Some(session);
                self.engine.play();
            }
            Err(err) => {
                error!(error = %err, code = err.error_code(), uri = %item.source_uri, "Failed to load clip");
                if let Err(err) = self.publish_load_failure(generation, &err) {
                    error!(error = %err, code = err.error_code(), "State machine unavailable");
                }
            }
        }
    }

    /// React to a new selection; selecting the current clip again does nothing
    #[instrument(skip(self, item), fields(item = %item.title))]
    pub fn on_selection_changed(&mut self, item: &MediaItem) {
        if self.current_item().map(|current| current.id) == Some(item.id) {
            debug!("Selection unchanged");
            return;
        }

        self.engine.pause();
        self.load_and_play(item);
    }

    /// Stop playback and release the session
    pub fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            self.engine.pause();
            session.close();
            info!("Playback torn down");
        }
    }

    fn publish_load_failure(&self, generation: u64, err: &Error) -> Result<()> {
        // load failed before attach; give the failure a session of its own
        if self.machine.generation() == generation {
            self.machine.reset()?;
        }
        self.machine.report_failure(err.state_message())
    }

    fn start_session(&self, item: &MediaItem) -> Result<PlayerSession> {
        let engine_item = self.engine.replace_current_item(&item.source_uri)?;
        let engine: Arc<dyn MediaEngine> = self.engine.clone();
        let subscription = self.machine.attach(engine, engine_item)?;
        self.engine.set_action_at_item_end(ActionAtItemEnd::Pause);

        Ok(PlayerSession::new(
            item.clone(),
            engine_item,
            self.machine.generation(),
            subscription,
        ))
    }

    pub fn current_item(&self) -> Option<&MediaItem> {
        self.session.as_ref().map(|session| session.item())
    }

    pub fn session(&self) -> Option<&PlayerSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> PlaybackState {
        self.machine.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaybackState> {
        self.machine.subscribe()
    }

    pub fn state_machine(&self) -> &PlayerStateMachine {
        &self.machine
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Wait until every engine signal received so far is reflected in the state
    pub async fn flush(&self) -> Result<()> {
        self.machine.flush().await
    }
}

impl<E: MediaEngine> Drop for PlaybackController<E> {
    fn drop(&mut self) {
        self.teardown();
    }
}
