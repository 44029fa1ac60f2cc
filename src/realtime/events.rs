//! Realtime API client and server events

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Event sent to the realtime AI service
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Configure the session
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionConfig },

    /// Append caller audio to the input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioAppend { audio: String },

    /// Add an item to the conversation
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: ConversationItem },

    /// Cut an assistant item's audio at the point the caller stopped hearing it
    #[serde(rename = "conversation.item.truncate")]
    ConversationItemTruncate {
        item_id: String,
        content_index: u32,
        audio_end_ms: u64,
    },

    /// Ask the model to generate a response
    #[serde(rename = "response.create")]
    ResponseCreate,
}

impl ClientEvent {
    /// Serialize to the JSON text sent over the socket
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Wire name of this event
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SessionUpdate { .. } => "session.update",
            Self::InputAudioAppend { .. } => "input_audio_buffer.append",
            Self::ConversationItemCreate { .. } => "conversation.item.create",
            Self::ConversationItemTruncate { .. } => "conversation.item.truncate",
            Self::ResponseCreate => "response.create",
        }
    }
}

/// Session configuration carried by `session.update`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionConfig {
    pub turn_detection: TurnDetection,
    pub input_audio_format: String,
    pub output_audio_format: String,
    pub voice: String,
    pub instructions: String,
    pub modalities: Vec<String>,
    pub temperature: f32,
}

/// Server-side voice activity detection parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnDetection {
    #[serde(rename = "type")]
    pub kind: String,
    /// Activation threshold, 0.0 to 1.0
    pub threshold: f32,
    /// Audio kept from before detected speech
    pub prefix_padding_ms: u32,
    /// Trailing silence that ends the caller's turn
    pub silence_duration_ms: u32,
}

/// Conversation item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub role: String,
    pub content: Vec<ContentPart>,
}

impl ConversationItem {
    /// User message with a single text part
    #[must_use]
    pub fn user_text(text: &str) -> Self {
        Self {
            kind: "message".to_string(),
            role: "user".to_string(),
            content: vec![ContentPart {
                kind: "input_text".to_string(),
                text: text.to_string(),
            }],
        }
    }
}

/// Content part of a conversation item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

/// Event received from the realtime AI service, reduced to what the relay acts on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    /// A chunk of synthesized speech
    AudioDelta {
        delta: String,
        item_id: Option<String>,
    },
    /// Server VAD detected the caller starting to talk
    SpeechStarted,
    /// The service reported an error
    Error { message: String },
    /// Any other event, by type
    Other(String),
}

impl ServerEvent {
    /// Wire type of this event
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::AudioDelta { .. } => "response.audio.delta",
            Self::SpeechStarted => "input_audio_buffer.speech_started",
            Self::Error { .. } => "error",
            Self::Other(kind) => kind,
        }
    }
}

#[derive(Deserialize)]
struct RawServerEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<String>,
    #[serde(default)]
    item_id: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Decode a text message from the realtime socket
///
/// An audio delta with an empty payload carries nothing to play and decodes
/// as [`ServerEvent::Other`].
///
/// # Errors
///
/// Returns [`Error::RealtimeEvent`] if the text is not a JSON object with a `type`
pub fn decode(text: &str) -> Result<ServerEvent> {
    let raw: RawServerEvent =
        serde_json::from_str(text).map_err(|e| Error::RealtimeEvent(e.to_string()))?;

    let event = match raw.kind.as_str() {
        "response.audio.delta" => match raw.delta {
            Some(delta) if !delta.is_empty() => ServerEvent::AudioDelta {
                delta,
                item_id: raw.item_id.filter(|id| !id.is_empty()),
            },
            _ => ServerEvent::Other(raw.kind),
        },
        "input_audio_buffer.speech_started" => ServerEvent::SpeechStarted,
        "error" => ServerEvent::Error {
            message: raw
                .error
                .as_ref()
                .and_then(|e| e.get("message"))
                .and_then(serde_json::Value::as_str)
                .map_or_else(|| "unknown error".to_string(), ToString::to_string),
        },
        _ => ServerEvent::Other(raw.kind),
    };

    Ok(event)
}
