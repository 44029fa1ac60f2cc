//! Media-stream wire frames
//!
//! Inbound frames arrive as JSON text messages tagged by `event`. Twilio sends
//! numeric fields such as `timestamp` as strings, so both encodings are
//! accepted.

use serde::{Deserialize, Deserializer, Serialize};

use crate::{Error, Result};

/// Mark name used for every playback acknowledgement token
pub const RESPONSE_PART_MARK: &str = "responsePart";

/// Event names decoded into a typed frame; everything else becomes [`InboundFrame::Other`]
const KNOWN_EVENTS: &[&str] = &["connected", "start", "media", "mark", "stop"];

/// Frame received from the telephony side
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum InboundFrame {
    /// Socket handshake notice, sent before `start`
    Connected,
    /// The media stream has begun
    Start { start: StreamStart },
    /// A chunk of caller audio
    Media { media: MediaChunk },
    /// A previously sent mark has finished playing
    Mark {
        #[serde(default)]
        mark: Option<MarkLabel>,
    },
    /// The stream has ended
    Stop,
    /// Any event kind this relay does not act on
    #[serde(skip)]
    Other(String),
}

/// Metadata carried by the `start` event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStart {
    pub stream_sid: String,
    #[serde(default)]
    pub call_sid: Option<String>,
}

/// Caller audio carried by a `media` event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MediaChunk {
    /// Milliseconds since the stream started, in the telephony clock
    #[serde(deserialize_with = "millis")]
    pub timestamp: u64,
    /// Base64 encoded audio
    pub payload: String,
}

/// Named mark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkLabel {
    pub name: String,
}

/// Frame sent to the telephony side
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum OutboundFrame {
    /// Audio to play to the caller
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        media: OutboundMedia,
    },
    /// Playback marker, echoed back once the audio queued before it has played
    Mark {
        #[serde(rename = "streamSid")]
        stream_sid: String,
        mark: MarkLabel,
    },
    /// Drop all buffered audio that has not played yet
    Clear {
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },
}

/// Audio payload of an outbound `media` frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMedia {
    pub payload: String,
}

impl OutboundFrame {
    /// Play a base64 audio chunk on the given stream
    #[must_use]
    pub fn media(stream_sid: &str, payload: String) -> Self {
        Self::Media {
            stream_sid: stream_sid.to_string(),
            media: OutboundMedia { payload },
        }
    }

    /// Playback marker on the given stream
    #[must_use]
    pub fn mark(stream_sid: &str, name: &str) -> Self {
        Self::Mark {
            stream_sid: stream_sid.to_string(),
            mark: MarkLabel {
                name: name.to_string(),
            },
        }
    }

    /// Clear buffered audio on the given stream
    #[must_use]
    pub fn clear(stream_sid: &str) -> Self {
        Self::Clear {
            stream_sid: stream_sid.to_string(),
        }
    }

    /// Serialize to the JSON text sent over the socket
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Deserialize)]
struct Envelope {
    event: String,
}

/// Decode a text frame from the telephony socket
///
/// # Errors
///
/// Returns [`Error::TelephonyFrame`] if the text is not JSON, has no `event`
/// tag, or a known event is missing required fields
pub fn decode(text: &str) -> Result<InboundFrame> {
    let envelope: Envelope =
        serde_json::from_str(text).map_err(|e| Error::TelephonyFrame(e.to_string()))?;

    if !KNOWN_EVENTS.contains(&envelope.event.as_str()) {
        return Ok(InboundFrame::Other(envelope.event));
    }

    serde_json::from_str(text).map_err(|e| {
        Error::TelephonyFrame(format!("invalid {} frame: {e}", envelope.event))
    })
}

fn millis<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Millis {
        Number(u64),
        Text(String),
    }

    match Millis::deserialize(deserializer)? {
        Millis::Number(n) => Ok(n),
        Millis::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
