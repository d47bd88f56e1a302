//! Playback state reducer
//!
//! Pure `(state, event) -> transition` function. Everything the engine
//! reports is turned into a [`PlayerEvent`] first, so the mapping can be
//! exercised without any engine.

use crate::{PlaybackState, TimeControlStatus};
use serde::{Deserialize, Serialize};

/// Input of the reducer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "detail", rename_all = "snake_case")]
pub enum PlayerEvent {
    /// Engine time control status changed
    TimeControl(TimeControlStatus),
    /// Current item played to its end
    ReachedEnd,
    /// Engine reported a failure, with the extracted message if any
    Failed(Option<String>),
    /// A new item was loaded into a fresh session
    Reset,
}

/// Output of the reducer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Publish this state, even when it equals the current one
    Publish(PlaybackState),
    /// Leave the published state untouched
    Ignore(&'static str),
}

impl Transition {
    pub fn published(&self) -> Option<&PlaybackState> {
        match self {
            Transition::Publish(state) => Some(state),
            Transition::Ignore(_) => None,
        }
    }
}

impl From<TimeControlStatus> for PlaybackState {
    fn from(status: TimeControlStatus) -> Self {
        match status {
            TimeControlStatus::Paused => PlaybackState::Paused,
            TimeControlStatus::WaitingToPlayAtSpecifiedRate => PlaybackState::WaitingToPlayAtRate,
            TimeControlStatus::Playing => PlaybackState::Playing,
        }
    }
}

/// Compute the transition caused by `event` in state `current`.
///
/// `Error` and `ReachedEnd` absorb everything but `Reset`, so neither the
/// pause an engine emits at end of item nor a late failure can hide the end.
pub fn reduce(current: &PlaybackState, event: &PlayerEvent) -> Transition {
    match (current, event) {
        (_, PlayerEvent::Reset) => Transition::Publish(PlaybackState::Idle),

        (PlaybackState::Error(_), _) => Transition::Ignore("session already failed"),
        (PlaybackState::ReachedEnd, _) => Transition::Ignore("item already reached its end"),

        (_, PlayerEvent::Failed(Some(message))) => {
            Transition::Publish(PlaybackState::Error(message.clone()))
        }
        (_, PlayerEvent::Failed(None)) => Transition::Ignore("failure without error detail"),

        (_, PlayerEvent::ReachedEnd) => Transition::Publish(PlaybackState::ReachedEnd),
        (_, PlayerEvent::TimeControl(status)) => Transition::Publish((*status).into()),
    }
}
