//! Media-stream WebSocket: one call session per connection

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Path, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use futures::{SinkExt, StreamExt};
use uuid::Uuid;

use super::ApiState;
use crate::bridge::{CallRelay, Leg};

/// Build media-stream router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/media-stream", get(upgrade_untracked))
        .route("/media-stream/{token}", get(upgrade_with_token))
        .with_state(state)
}

async fn upgrade_with_token(
    State(state): State<Arc<ApiState>>,
    Path(token): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let token = Uuid::parse_str(&token).ok();
    ws.on_upgrade(move |socket| handle_socket(socket, state, token))
}

async fn upgrade_untracked(
    State(state): State<Arc<ApiState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, None))
}

/// Run one call from connect to teardown
async fn handle_socket(mut socket: WebSocket, state: Arc<ApiState>, token: Option<Uuid>) {
    tracing::info!(call_token = ?token, "client connected");

    let pending = match token {
        Some(token) => state.pending.take(&token).await,
        None => None,
    };
    let instructions = match pending {
        Some(call) => {
            tracing::debug!(call_sid = ?call.call_sid, "claimed persona rendered at call arrival");
            call.instructions
        }
        None => {
            tracing::debug!("no pending call for this stream, rendering persona now");
            state.render_persona().await
        }
    };

    let realtime = match state.realtime.connect().await {
        Ok(leg) => leg,
        Err(e) => {
            tracing::error!(error = %e, "failed to connect to the realtime API, hanging up");
            let _ = socket.send(Message::Close(None)).await;
            return;
        }
    };

    let relay = CallRelay::new(state.session.opening_events(&instructions))
        .with_settle_delay(state.settle_delay)
        .with_logged_event_types(state.log_event_types.clone());

    let end = relay.run(telephony_leg(socket), realtime).await;
    tracing::info!(call_token = ?token, reason = ?end, "call session ended");
}

/// Split the telephony socket into pump tasks feeding a [`Leg`]
fn telephony_leg(socket: WebSocket) -> Leg {
    let (mut sink, mut stream) = socket.split();
    let (leg, peer) = Leg::pair("telephony");
    let to_relay = peer.to_relay;
    let mut from_relay = peer.from_relay;

    let reader = tokio::spawn(async move {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if to_relay.send(text.as_str().to_owned()).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "telephony socket error");
                    break;
                }
            }
        }
    });

    let writer = tokio::spawn(async move {
        while let Some(text) = from_relay.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                return;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    leg.with_tasks(reader, writer)
}
