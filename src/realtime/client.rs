//! Outbound realtime AI connection

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, header};

use crate::bridge::Leg;
use crate::{Error, Result};

/// Default limit on dialing the AI, handshake included
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens one realtime connection per call
#[derive(Debug)]
pub struct RealtimeConnector {
    url: String,
    model: String,
    api_key: SecretString,
    connect_timeout: Duration,
}

impl RealtimeConnector {
    /// Create a connector for `url` (e.g. `wss://api.openai.com/v1/realtime`)
    #[must_use]
    pub const fn new(url: String, model: String, api_key: SecretString) -> Self {
        Self {
            url,
            model,
            api_key,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the dial timeout
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Endpoint including the model query parameter
    #[must_use]
    pub fn endpoint(&self) -> String {
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{separator}model={}", self.url, self.model)
    }

    /// Connect and spawn the socket pumps
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be built, or the handshake fails
    /// or does not finish within the connect timeout
    pub async fn connect(&self) -> Result<Leg> {
        let mut request = self.endpoint().into_client_request()?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose_secret()))
            .map_err(|e| Error::Realtime(format!("invalid API key header: {e}")))?;
        let headers = request.headers_mut();
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert("openai-beta", HeaderValue::from_static("realtime=v1"));

        let (stream, response) = tokio::time::timeout(self.connect_timeout, connect_async(request))
            .await
            .map_err(|_| {
                Error::Realtime(format!(
                    "no handshake from the realtime API after {}s",
                    self.connect_timeout.as_secs_f32()
                ))
            })??;
        tracing::info!(status = %response.status(), model = %self.model, "connected to the realtime API");

        let (mut sink, mut source) = stream.split();
        let (leg, peer) = Leg::pair("realtime");
        let to_relay = peer.to_relay;
        let mut from_relay = peer.from_relay;

        let reader = tokio::spawn(async move {
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(text)) => {
                        if to_relay.send(text.as_str().to_owned()).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        tracing::info!(?frame, "realtime API closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(error = %e, "error in the realtime websocket");
                        break;
                    }
                }
            }
        });

        let writer = tokio::spawn(async move {
            while let Some(text) = from_relay.recv().await {
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    tracing::warn!(error = %e, "failed to write to the realtime API");
                    return;
                }
            }
            let _ = sink.send(Message::Close(None)).await;
        });

        Ok(leg.with_tasks(reader, writer))
    }
}
