//! Error types for ClipDeck Core

use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
///
/// None of these reach the view layer directly. Anything that happens while
/// a clip is loading or playing is folded into
/// [`PlaybackState::Error`](crate::PlaybackState::Error) by the controller.
#[derive(Error, Debug)]
pub enum Error {
    // Catalog errors
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    // Engine errors
    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Failed to load {uri}: {reason}")]
    Load { uri: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    // State machine errors
    #[error("State machine channel closed")]
    ChannelClosed,

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an engine error
    pub fn engine(msg: impl Into<String>) -> Self {
        Error::Engine(msg.into())
    }

    /// Returns true if selecting another clip can recover from this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Engine(_) | Error::Load { .. } | Error::UnknownItem(_))
    }

    /// Returns the error code used in logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidCatalog(_) => "INVALID_CATALOG",
            Error::UnknownItem(_) => "UNKNOWN_ITEM",
            Error::Engine(_) => "ENGINE",
            Error::Load { .. } => "LOAD",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "CONFIG_JSON",
            Error::ChannelClosed => "CHANNEL_CLOSED",
            Error::Internal(_) => "INTERNAL",
        }
    }

    /// Text published in [`PlaybackState::Error`](crate::PlaybackState::Error),
    /// in the same `"<domain>: <detail>"` shape as engine failures
    pub fn state_message(&self) -> String {
        match self {
            Error::Load { reason, .. } => format!("{}.load: {}", ERROR_DOMAIN, reason),
            Error::Engine(msg) => format!("{}.engine: {}", ERROR_DOMAIN, msg),
            other => format!(
                "{}.{}: {}",
                ERROR_DOMAIN,
                other.error_code().to_lowercase(),
                other
            ),
        }
    }
}

/// Domain prefix of failures raised by this crate rather than the engine
pub const ERROR_DOMAIN: &str = "clipdeck";
