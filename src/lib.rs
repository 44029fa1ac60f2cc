//! Switchboard - bridges phone-call media streams with a realtime voice AI
//!
//! Each inbound call gets its own relay that forwards caller audio to a
//! speech-to-speech AI session and the AI's speech back to the caller,
//! tracking playback so the caller can interrupt ("barge in") at any time.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   media frames    ┌──────────────────┐   realtime events   ┌──────────────┐
//! │  Telephony   │ ◄───────────────► │    CallRelay     │ ◄─────────────────► │  Realtime AI │
//! │  media WS    │                   │   Coordinator    │                     │  WS session  │
//! └──────────────┘                   └──────────────────┘                     └──────────────┘
//!        ▲
//!        │ TwiML <Connect><Stream>
//! ┌──────┴───────┐
//! │/incoming-call│  persona script + schedule rendered per call
//! └──────────────┘
//! ```

pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod persona;
pub mod realtime;
pub mod schedule;
pub mod telephony;

pub use bridge::{Action, CallEnd, CallRelay, CallSession, Coordinator, Leg, LegPeer};
pub use config::Config;
pub use error::{Error, Result};
pub use persona::PersonaTemplate;
pub use realtime::{ClientEvent, RealtimeConnector, ServerEvent, SessionSettings};
pub use schedule::ScheduleFetcher;
pub use telephony::{InboundFrame, OutboundFrame};
