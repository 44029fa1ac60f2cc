//! Call session lifecycle
//!
//! One [`CallRelay`] per phone call. It consumes both legs and the one-shot
//! settle timer from a single task, so coordinator updates never interleave.
//! When either leg closes, or a write to either leg fails, both legs are torn
//! down and the call state is dropped.

use std::sync::Arc;
use std::time::Duration;

use super::coordinator::{Action, Coordinator};
use super::leg::Leg;
use crate::realtime::{self, ClientEvent, ServerEvent};
use crate::telephony;

/// Default delay between the realtime socket opening and the session setup
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Why a call session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallEnd {
    /// The telephony socket closed
    CallerHungUp,
    /// The realtime AI socket closed
    RealtimeClosed,
    /// A leg stopped accepting writes or its queue filled up
    WriteFailed(&'static str),
}

/// Relay for a single call
#[derive(Debug)]
pub struct CallRelay {
    coordinator: Coordinator,
    opening: Vec<ClientEvent>,
    settle_delay: Duration,
    logged_event_types: Arc<[String]>,
}

impl CallRelay {
    /// Create a relay that sends `opening` to the AI once the connection has settled
    #[must_use]
    pub fn new(opening: Vec<ClientEvent>) -> Self {
        Self {
            coordinator: Coordinator::new(),
            opening,
            settle_delay: DEFAULT_SETTLE_DELAY,
            logged_event_types: Arc::from(Vec::new()),
        }
    }

    /// Override the settle delay
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Realtime event types logged at info level as they arrive
    #[must_use]
    pub fn with_logged_event_types(mut self, types: Arc<[String]>) -> Self {
        self.logged_event_types = types;
        self
    }

    /// Run the call until either leg ends, then close both
    pub async fn run(mut self, mut telephony: Leg, mut realtime: Leg) -> CallEnd {
        let settle = tokio::time::sleep(self.settle_delay);
        tokio::pin!(settle);
        let mut opened = false;

        let end = loop {
            let actions = tokio::select! {
                () = &mut settle, if !opened => {
                    opened = true;
                    tracing::debug!(events = self.opening.len(), "sending session setup");
                    std::mem::take(&mut self.opening)
                        .into_iter()
                        .map(Action::Realtime)
                        .collect()
                }
                frame = telephony.recv() => match frame {
                    Some(text) => self.on_telephony_text(&text),
                    None => {
                        tracing::info!("caller disconnected");
                        break CallEnd::CallerHungUp;
                    }
                },
                message = realtime.recv() => match message {
                    Some(text) => self.on_realtime_text(&text),
                    None => {
                        tracing::info!("disconnected from the realtime API");
                        break CallEnd::RealtimeClosed;
                    }
                },
            };

            if let Err(end) = dispatch(actions, &telephony, &realtime) {
                break end;
            }
        };

        telephony.close().await;
        realtime.close().await;
        end
    }

    fn on_telephony_text(&mut self, text: &str) -> Vec<Action> {
        match telephony::decode(text) {
            Ok(frame) => self.coordinator.on_telephony(frame),
            Err(e) => {
                tracing::warn!(error = %e, "dropping telephony frame");
                Vec::new()
            }
        }
    }

    fn on_realtime_text(&mut self, text: &str) -> Vec<Action> {
        match realtime::decode(text) {
            Ok(event) => {
                self.log_event(&event, text);
                self.coordinator.on_realtime(event)
            }
            Err(e) => {
                tracing::warn!(error = %e, "dropping realtime message");
                Vec::new()
            }
        }
    }

    fn log_event(&self, event: &ServerEvent, raw: &str) {
        let kind = event.kind();
        if self.logged_event_types.iter().any(|t| t == kind) {
            tracing::info!(event_type = kind, event = raw, "received realtime event");
        } else {
            tracing::trace!(event_type = kind, "received realtime event");
        }
    }
}

fn dispatch(actions: Vec<Action>, telephony: &Leg, realtime: &Leg) -> Result<(), CallEnd> {
    for action in actions {
        let (leg, encoded) = match &action {
            Action::Telephony(frame) => (telephony, frame.encode()),
            Action::Realtime(event) => (realtime, event.encode()),
        };
        let text = match encoded {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(error = %e, leg = leg.name(), "failed to encode outbound frame");
                continue;
            }
        };
        if let Err(e) = leg.send(text) {
            tracing::error!(error = %e, "write failed, ending call");
            return Err(CallEnd::WriteFailed(leg.name()));
        }
    }
    Ok(())
}
