//! Voice-AI session adapter
//!
//! Speaks the realtime speech-to-speech protocol: one bearer-authenticated
//! WebSocket per call, JSON events tagged by `type` in both directions.

pub mod client;
pub mod events;
pub mod session;

pub use client::{DEFAULT_CONNECT_TIMEOUT, RealtimeConnector};
pub use events::{
    ClientEvent, ContentPart, ConversationItem, ServerEvent, SessionConfig, TurnDetection, decode,
};
pub use session::SessionSettings;

/// Server event types worth an info-level log line by default
pub const DEFAULT_LOGGED_EVENT_TYPES: &[&str] = &[
    "error",
    "response.content.done",
    "rate_limits.updated",
    "response.done",
    "input_audio_buffer.committed",
    "input_audio_buffer.speech_stopped",
    "input_audio_buffer.speech_started",
    "session.created",
];
