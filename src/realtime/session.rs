//! Session configuration and conversation seed for a new call

use super::events::{ClientEvent, ConversationItem, SessionConfig, TurnDetection};

/// Default voice identity
pub const DEFAULT_VOICE: &str = "alloy";

/// Default greeting the assistant opens the call with
pub const DEFAULT_GREETING: &str = "Greet the caller warmly and say: \
\"Hi, I'm your virtual assistant. How can I help you today?\"";

/// Tunables applied to every realtime session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Voice identity
    pub voice: String,
    /// Audio codec for both directions (telephony uses 8kHz mu-law)
    pub audio_format: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Server VAD activation threshold
    pub vad_threshold: f32,
    /// Audio retained before detected speech
    pub vad_prefix_padding_ms: u32,
    /// Trailing silence that ends the caller's turn
    pub vad_silence_duration_ms: u32,
    /// Instruction seeding the assistant's opening line
    pub greeting: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            voice: DEFAULT_VOICE.to_string(),
            audio_format: "g711_ulaw".to_string(),
            temperature: 0.8,
            vad_threshold: 0.5,
            vad_prefix_padding_ms: 300,
            vad_silence_duration_ms: 750,
            greeting: DEFAULT_GREETING.to_string(),
        }
    }
}

impl SessionSettings {
    /// `session.update` carrying these settings and the call's persona script
    #[must_use]
    pub fn session_update(&self, instructions: &str) -> ClientEvent {
        ClientEvent::SessionUpdate {
            session: SessionConfig {
                turn_detection: TurnDetection {
                    kind: "server_vad".to_string(),
                    threshold: self.vad_threshold,
                    prefix_padding_ms: self.vad_prefix_padding_ms,
                    silence_duration_ms: self.vad_silence_duration_ms,
                },
                input_audio_format: self.audio_format.clone(),
                output_audio_format: self.audio_format.clone(),
                voice: self.voice.clone(),
                instructions: instructions.to_string(),
                modalities: vec!["text".to_string(), "audio".to_string()],
                temperature: self.temperature,
            },
        }
    }

    /// Events sent once the connection has settled: configuration, the
    /// greeting seed, and the trigger that makes the assistant speak first
    #[must_use]
    pub fn opening_events(&self, instructions: &str) -> Vec<ClientEvent> {
        vec![
            self.session_update(instructions),
            ClientEvent::ConversationItemCreate {
                item: ConversationItem::user_text(&self.greeting),
            },
            ClientEvent::ResponseCreate,
        ]
    }
}
