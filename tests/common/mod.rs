//! Shared test utilities
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::{Value, json};
use switchboard::api::ApiState;
use switchboard::bridge::PendingCalls;
use switchboard::realtime::DEFAULT_LOGGED_EVENT_TYPES;
use switchboard::{
    CallEnd, CallRelay, Leg, LegPeer, PersonaTemplate, RealtimeConnector, ScheduleFetcher,
    SessionSettings,
};
use tokio::task::JoinHandle;

/// API state with no schedule source and an unreachable realtime endpoint
#[must_use]
pub fn test_state(public_host: Option<&str>) -> Arc<ApiState> {
    Arc::new(ApiState {
        public_host: public_host.map(ToString::to_string),
        persona: PersonaTemplate::new("You are a test persona. {{schedule}}", chrono_tz::Tz::UTC),
        schedule: ScheduleFetcher::new(None, false, Duration::from_secs(1))
            .expect("failed to build schedule fetcher"),
        realtime: RealtimeConnector::new(
            "ws://127.0.0.1:1/v1/realtime".to_string(),
            "test-model".to_string(),
            SecretString::from("sk-test".to_string()),
        ),
        session: SessionSettings::default(),
        settle_delay: Duration::from_millis(100),
        log_event_types: DEFAULT_LOGGED_EVENT_TYPES
            .iter()
            .map(ToString::to_string)
            .collect(),
        pending: PendingCalls::default(),
    })
}

/// A relay running on in-memory legs
pub struct RunningCall {
    pub handle: JoinHandle<CallEnd>,
    pub telephony: LegPeer,
    pub realtime: LegPeer,
}

/// Spawn a relay with the default session settings and a 100ms settle delay
pub fn spawn_call() -> RunningCall {
    let (telephony_leg, telephony) = Leg::pair("telephony");
    let (realtime_leg, realtime) = Leg::pair("realtime");
    let relay = CallRelay::new(SessionSettings::default().opening_events("test script"))
        .with_settle_delay(Duration::from_millis(100));

    RunningCall {
        handle: tokio::spawn(relay.run(telephony_leg, realtime_leg)),
        telephony,
        realtime,
    }
}

/// Receive the next frame the relay wrote to a leg, as JSON
pub async fn next_json(peer: &mut LegPeer) -> Value {
    let text = tokio::time::timeout(Duration::from_secs(5), peer.from_relay.recv())
        .await
        .expect("timed out waiting for relay output")
        .expect("leg closed");
    serde_json::from_str(&text).expect("relay wrote invalid JSON")
}

/// Consume the session setup events sent after the settle delay
pub async fn expect_opening(peer: &mut LegPeer) {
    for expected in ["session.update", "conversation.item.create", "response.create"] {
        assert_eq!(next_json(peer).await["type"], expected);
    }
}

/// Push a JSON frame into a leg as if it arrived on the socket
pub async fn push(peer: &LegPeer, frame: Value) {
    peer.to_relay
        .send(frame.to_string())
        .await
        .expect("relay stopped reading");
}

/// Let the relay drain everything queued so far
///
/// With the clock paused, time only advances once every task is idle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub fn start_frame(stream_sid: &str) -> Value {
    json!({
        "event": "start",
        "sequenceNumber": "1",
        "start": { "streamSid": stream_sid, "callSid": "CA-test", "tracks": ["inbound"] },
        "streamSid": stream_sid
    })
}

pub fn media_frame(timestamp: u64) -> Value {
    json!({
        "event": "media",
        "media": { "track": "inbound", "chunk": "1", "timestamp": timestamp.to_string(), "payload": "/w==" }
    })
}

pub fn mark_frame() -> Value {
    json!({ "event": "mark", "mark": { "name": "responsePart" } })
}

pub fn audio_delta(delta: &str, item_id: &str) -> Value {
    json!({ "type": "response.audio.delta", "response_id": "resp_1", "item_id": item_id, "delta": delta })
}

pub fn speech_started() -> Value {
    json!({ "type": "input_audio_buffer.speech_started", "audio_start_ms": 500, "item_id": "caller_1" })
}
