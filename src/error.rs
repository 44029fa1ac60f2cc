//! Error types for the switchboard relay

use thiserror::Error;

/// Result type alias for switchboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while bridging a call
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Telephony media-stream frame could not be decoded
    #[error("telephony frame error: {0}")]
    TelephonyFrame(String),

    /// Realtime AI event could not be decoded
    #[error("realtime event error: {0}")]
    RealtimeEvent(String),

    /// Realtime AI connection error
    #[error("realtime connection error: {0}")]
    Realtime(String),

    /// Persona template error
    #[error("persona error: {0}")]
    Persona(String),

    /// A call leg closed or rejected a write
    #[error("call leg closed: {0}")]
    LegClosed(&'static str),

    /// A call leg's writer fell too far behind
    #[error("call leg backed up: {0}")]
    LegBackedUp(&'static str),

    /// WebSocket protocol error
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
