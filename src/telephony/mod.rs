//! Telephony channel adapter
//!
//! Codec for the provider's bidirectional media-stream protocol, plus the
//! markup that tells the provider to open that stream.

pub mod frames;
pub mod twiml;

pub use frames::{
    InboundFrame, MarkLabel, MediaChunk, OutboundFrame, OutboundMedia, RESPONSE_PART_MARK,
    StreamStart, decode,
};
