//! Inbound call trigger
//!
//! The telephony provider requests this endpoint when a call arrives. The
//! persona script is rendered here, registered under a one-time token, and
//! the response tells the provider to stream the call's audio to
//! `/media-stream/{token}`.

use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{State, rejection::FormRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};
use serde::Deserialize;

use super::ApiState;
use crate::telephony::twiml;

/// Build call trigger router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/incoming-call", any(incoming_call))
        .with_state(state)
}

/// Fields of the provider's call webhook this relay reads
#[derive(Debug, Default, Deserialize)]
pub struct IncomingCall {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "From")]
    pub from: Option<String>,
}

/// Answer an incoming call with a media-stream instruction
async fn incoming_call(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    form: Result<Form<IncomingCall>, FormRejection>,
) -> Response {
    let call = form.map(|Form(call)| call).unwrap_or_default();

    let Some(host) = stream_host(state.public_host.as_deref(), &headers) else {
        tracing::warn!("incoming call without a Host header");
        return (StatusCode::BAD_REQUEST, "missing Host header").into_response();
    };

    let instructions = state.render_persona().await;
    let token = state
        .pending
        .register(call.call_sid.clone(), instructions)
        .await;
    let stream_url = format!("wss://{host}/media-stream/{token}");

    tracing::info!(
        call_sid = ?call.call_sid,
        from = ?call.from,
        call_token = %token,
        "incoming call, connecting media stream"
    );

    (
        [(header::CONTENT_TYPE, "text/xml")],
        twiml::connect_stream(&stream_url),
    )
        .into_response()
}

/// Host for the stream URL: the configured public host, else the request's Host header
fn stream_host(public_host: Option<&str>, headers: &HeaderMap) -> Option<String> {
    let host = public_host.map(ToString::to_string).or_else(|| {
        headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    })?;

    let host = host
        .trim()
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_end_matches('/');
    (!host.is_empty()).then(|| host.to_string())
}
