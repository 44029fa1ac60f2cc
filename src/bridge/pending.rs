//! Per-call persona handoff between the call trigger and the media stream
//!
//! The call trigger renders the persona script and registers it under a fresh
//! token that is embedded in the stream URL. The media-stream socket then
//! claims it exactly once, so every call runs with the script rendered for it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

/// How long a registered call waits for its media stream
pub const PENDING_TTL: Duration = Duration::from_secs(120);

/// A call that has been answered but whose media stream has not connected yet
#[derive(Debug, Clone)]
pub struct PendingCall {
    /// Provider call identifier, when the trigger carried one
    pub call_sid: Option<String>,
    /// Persona script rendered for this call
    pub instructions: String,
    registered_at: Instant,
}

/// Registry of pending calls keyed by stream token
#[derive(Debug, Clone)]
pub struct PendingCalls {
    calls: Arc<RwLock<HashMap<Uuid, PendingCall>>>,
    ttl: Duration,
}

impl Default for PendingCalls {
    fn default() -> Self {
        Self::new(PENDING_TTL)
    }
}

impl PendingCalls {
    /// Create an empty registry
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            calls: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Register a call and return its stream token
    ///
    /// Expired entries are pruned on every registration.
    pub async fn register(&self, call_sid: Option<String>, instructions: String) -> Uuid {
        let token = Uuid::new_v4();
        let mut calls = self.calls.write().await;

        let before = calls.len();
        calls.retain(|_, call| call.registered_at.elapsed() < self.ttl);
        let pruned = before - calls.len();
        if pruned > 0 {
            tracing::debug!(pruned, "pruned pending calls that never connected");
        }

        calls.insert(
            token,
            PendingCall {
                call_sid,
                instructions,
                registered_at: Instant::now(),
            },
        );
        token
    }

    /// Claim a pending call; a token can be claimed once
    pub async fn take(&self, token: &Uuid) -> Option<PendingCall> {
        let call = self.calls.write().await.remove(token)?;
        if call.registered_at.elapsed() >= self.ttl {
            tracing::debug!(token = %token, "pending call expired before its stream connected");
            return None;
        }
        Some(call)
    }

    /// Number of calls waiting for their stream
    pub async fn len(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Whether no calls are waiting
    pub async fn is_empty(&self) -> bool {
        self.calls.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_is_claimed_once() {
        let pending = PendingCalls::default();
        let token = pending
            .register(Some("CA1".to_string()), "script".to_string())
            .await;

        let call = pending.take(&token).await.unwrap();
        assert_eq!(call.call_sid.as_deref(), Some("CA1"));
        assert_eq!(call.instructions, "script");
        assert!(pending.take(&token).await.is_none());
        assert!(pending.is_empty().await);
    }

    #[tokio::test]
    async fn calls_are_isolated_by_token() {
        let pending = PendingCalls::default();
        let first = pending.register(None, "first".to_string()).await;
        let second = pending.register(None, "second".to_string()).await;

        assert_eq!(pending.take(&second).await.unwrap().instructions, "second");
        assert_eq!(pending.take(&first).await.unwrap().instructions, "first");
    }

    #[tokio::test]
    async fn expired_calls_are_not_claimable() {
        let pending = PendingCalls::new(Duration::ZERO);
        let token = pending.register(None, "stale".to_string()).await;
        assert!(pending.take(&token).await.is_none());
    }

    #[tokio::test]
    async fn registration_prunes_expired_entries() {
        let pending = PendingCalls::new(Duration::ZERO);
        pending.register(None, "a".to_string()).await;
        pending.register(None, "b".to_string()).await;
        assert_eq!(pending.len().await, 1);
    }
}
