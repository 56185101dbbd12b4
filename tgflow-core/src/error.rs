//! Error types for tgflow.
//!
//! [`BotError`] covers ingestion, lifecycle and registration failures; [`HandlerError`] is what
//! application callbacks return.

use thiserror::Error;

/// Top-level error for tgflow (transport, remote envelope, decoding, lifecycle misuse, registration).
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote reported failure (code {code:?}): {description}")]
    RemoteFailure {
        code: Option<i64>,
        description: String,
    },

    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Polling loop is already running")]
    AlreadyRunning,

    #[error("Ingestion mode conflict: {0}")]
    ModeConflict(String),

    #[error("A bot interface for token {0} already exists")]
    DuplicateInterface(String),

    #[error("Pattern compile error: {0}")]
    Compile(#[from] regex::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Errors produced by update handlers.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Handler failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Bot(#[from] BotError),
}

/// Result type for core operations; uses [`BotError`].
pub type Result<T> = std::result::Result<T, BotError>;
