//! Availability document fetched for each incoming call
//!
//! The document is spliced into the persona script as-is. Any failure
//! degrades to an empty schedule rather than rejecting the call.

use std::time::Duration;

use reqwest::Client;

use crate::{Error, Result};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches the schedule document
#[derive(Debug, Clone)]
pub struct ScheduleFetcher {
    client: Client,
    url: Option<String>,
}

impl ScheduleFetcher {
    /// Create a fetcher; `url: None` always yields an empty schedule
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(url: Option<String>, accept_invalid_certs: bool, timeout: Duration) -> Result<Self> {
        if accept_invalid_certs && url.is_some() {
            tracing::warn!("schedule fetch accepts invalid TLS certificates");
        }
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .user_agent(concat!("switchboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;

        Ok(Self { client, url })
    }

    /// Fetch the document, or an empty string on any failure
    pub async fn fetch(&self) -> String {
        let Some(url) = &self.url else {
            return String::new();
        };

        match self.try_fetch(url).await {
            Ok(body) => {
                tracing::debug!(url = %url, bytes = body.len(), "fetched schedule");
                body
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "schedule fetch failed, continuing without it");
                String::new()
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
