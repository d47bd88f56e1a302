//! Core types for ClipDeck

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

/// Unique identifier for a player session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaItemId(pub Uuid);

impl MediaItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MediaItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MediaItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A selectable clip
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaItem {
    /// Unique identifier
    pub id: MediaItemId,
    /// Absolute source URL
    pub source_uri: Url,
    /// Label shown in the selector
    pub title: String,
    /// Symbol name for the selector icon
    pub icon: String,
}

impl MediaItem {
    pub fn new(source_uri: Url, title: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            id: MediaItemId::new(),
            source_uri,
            title: title.into(),
            icon: icon.into(),
        }
    }
}

impl std::fmt::Display for MediaItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title, self.source_uri)
    }
}

/// Published playback state
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum PlaybackState {
    /// Nothing loaded yet, or a new clip was just loaded
    #[default]
    Idle,
    /// Engine reports a paused rate
    Paused,
    /// Engine is buffering before it can start or resume
    WaitingToPlayAtRate,
    /// Engine is actively playing
    Playing,
    /// Current clip played to its end
    ReachedEnd,
    /// Playback failed, formatted as `"<domain>: <code>"`
    Error(String),
}

impl PlaybackState {
    /// No further engine signal changes this state until the next load.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlaybackState::ReachedEnd | PlaybackState::Error(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PlaybackState::Error(_))
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            PlaybackState::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Idle => write!(f, "idle"),
            PlaybackState::Paused => write!(f, "paused"),
            PlaybackState::WaitingToPlayAtRate => write!(f, "waiting_to_play_at_rate"),
            PlaybackState::Playing => write!(f, "playing"),
            PlaybackState::ReachedEnd => write!(f, "reached_end"),
            PlaybackState::Error(message) => write!(f, "error({})", message),
        }
    }
}
