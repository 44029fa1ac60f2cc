//! HTTP API server for the switchboard relay

pub mod calls;
pub mod health;
pub mod media_stream;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::bridge::PendingCalls;
use crate::persona::PersonaTemplate;
use crate::realtime::{RealtimeConnector, SessionSettings};
use crate::schedule::ScheduleFetcher;
use crate::{Config, Result};

/// Shared state for API handlers
#[derive(Debug)]
pub struct ApiState {
    /// Host used in stream URLs, overriding the request's Host header
    pub public_host: Option<String>,
    /// Persona script template
    pub persona: PersonaTemplate,
    /// Schedule document source
    pub schedule: ScheduleFetcher,
    /// Realtime AI dialer
    pub realtime: RealtimeConnector,
    /// Session tunables sent to the AI on every call
    pub session: SessionSettings,
    /// Delay before sending the session setup
    pub settle_delay: std::time::Duration,
    /// Realtime event types logged at info level
    pub log_event_types: Arc<[String]>,
    /// Calls answered but not yet streaming
    pub pending: PendingCalls,
}

impl ApiState {
    /// Build state from loaded configuration
    ///
    /// # Errors
    ///
    /// Returns error if the persona template cannot be loaded or the HTTP
    /// client cannot be built
    pub fn from_config(config: Config) -> Result<Self> {
        let persona = PersonaTemplate::load(
            config.persona.template_path.as_deref(),
            config.persona.timezone,
        )?
        .with_date_style(config.persona.date_style);
        let schedule = ScheduleFetcher::new(
            config.persona.schedule_url,
            config.persona.schedule_insecure_tls,
            config.persona.schedule_timeout,
        )?;
        let realtime = RealtimeConnector::new(
            config.realtime.url,
            config.realtime.model,
            config.realtime.api_key,
        )
        .with_connect_timeout(config.realtime.connect_timeout);

        Ok(Self {
            public_host: config.server.public_host,
            persona,
            schedule,
            realtime,
            session: config.session,
            settle_delay: config.realtime.settle_delay,
            log_event_types: Arc::from(config.log_event_types),
            pending: PendingCalls::default(),
        })
    }

    /// Render the persona script for a new call
    pub async fn render_persona(&self) -> String {
        let schedule = self.schedule.fetch().await;
        let script = self.persona.render(&schedule);
        tracing::debug!(instructions = %script, "rendered persona script");
        script
    }
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(calls::router(state.clone()))
        .merge(media_stream::router(state))
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server for `state` on `port`
    #[must_use]
    pub const fn new(state: Arc<ApiState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Run the API server until ctrl-c
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!(port = self.port, "server is listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutting down"),
        Err(e) => {
            tracing::warn!(error = %e, "failed to listen for ctrl-c, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
