//! Turn-taking coordinator
//!
//! Owns the per-call relay state and decides, for each decoded event from
//! either leg, which frames go out where. Pure logic: no sockets, no clock
//! other than the telephony media timestamps.
//!
//! Playback position is measured in the telephony clock. When the first chunk
//! of an assistant response is forwarded, the current media timestamp is
//! stamped as the response start. If the caller barges in while marks are
//! still outstanding, the difference between the latest media timestamp and
//! that stamp is how much of the response the caller actually heard, and the
//! assistant item is truncated there.

use std::collections::VecDeque;

use crate::realtime::{ClientEvent, ServerEvent};
use crate::telephony::{InboundFrame, OutboundFrame, RESPONSE_PART_MARK};

/// Something the coordinator wants written to a leg
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Frame for the telephony socket
    Telephony(OutboundFrame),
    /// Event for the realtime AI socket
    Realtime(ClientEvent),
}

/// State of one active call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallSession {
    /// Stream identifier, known once `start` arrives
    pub stream_sid: Option<String>,
    /// Timestamp of the most recent caller media frame, in ms
    pub latest_media_timestamp: u64,
    /// Media timestamp at which the current assistant response began playing
    pub response_start_timestamp: Option<u64>,
    /// Most recent assistant item, the truncation target
    pub last_assistant_item: Option<String>,
    /// Marks sent to the telephony side and not yet acknowledged
    pub mark_queue: VecDeque<String>,
}

/// Per-call turn-taking state machine
#[derive(Debug, Default)]
pub struct Coordinator {
    session: CallSession,
}

impl Coordinator {
    /// Coordinator for a fresh call
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current call state
    #[must_use]
    pub const fn session(&self) -> &CallSession {
        &self.session
    }

    /// Handle a decoded telephony frame
    pub fn on_telephony(&mut self, frame: InboundFrame) -> Vec<Action> {
        match frame {
            InboundFrame::Start { start } => {
                tracing::info!(stream_sid = %start.stream_sid, call_sid = ?start.call_sid, "incoming stream started");
                self.session.stream_sid = Some(start.stream_sid);
                self.session.latest_media_timestamp = 0;
                self.session.response_start_timestamp = None;
                Vec::new()
            }
            InboundFrame::Media { media } => {
                self.session.latest_media_timestamp = media.timestamp;
                tracing::trace!(timestamp = media.timestamp, "caller media");
                vec![Action::Realtime(ClientEvent::InputAudioAppend {
                    audio: media.payload,
                })]
            }
            InboundFrame::Mark { .. } => {
                self.acknowledge_mark();
                Vec::new()
            }
            InboundFrame::Connected => {
                tracing::debug!("telephony socket connected");
                Vec::new()
            }
            InboundFrame::Stop => {
                tracing::info!(stream_sid = ?self.session.stream_sid, "incoming stream stopped");
                Vec::new()
            }
            InboundFrame::Other(event) => {
                tracing::debug!(event = %event, "ignoring telephony event");
                Vec::new()
            }
        }
    }

    /// Handle a decoded realtime event
    pub fn on_realtime(&mut self, event: ServerEvent) -> Vec<Action> {
        match event {
            ServerEvent::AudioDelta { delta, item_id } => self.on_audio_delta(delta, item_id),
            ServerEvent::SpeechStarted => self.on_speech_started(),
            ServerEvent::Error { message } => {
                tracing::warn!(message = %message, "realtime service reported an error");
                Vec::new()
            }
            ServerEvent::Other(_) => Vec::new(),
        }
    }

    fn on_audio_delta(&mut self, delta: String, item_id: Option<String>) -> Vec<Action> {
        let Some(stream_sid) = self.session.stream_sid.clone() else {
            tracing::warn!("dropping assistant audio, stream has not started");
            return Vec::new();
        };

        if self.session.response_start_timestamp.is_none() {
            self.session.response_start_timestamp = Some(self.session.latest_media_timestamp);
            tracing::debug!(
                start_ms = self.session.latest_media_timestamp,
                "setting start timestamp for new response"
            );
        }

        if let Some(item_id) = item_id {
            self.session.last_assistant_item = Some(item_id);
        }

        self.session.mark_queue.push_back(RESPONSE_PART_MARK.to_string());

        vec![
            Action::Telephony(OutboundFrame::media(&stream_sid, delta)),
            Action::Telephony(OutboundFrame::mark(&stream_sid, RESPONSE_PART_MARK)),
        ]
    }

    fn on_speech_started(&mut self) -> Vec<Action> {
        let Some(response_start) = self.session.response_start_timestamp else {
            return Vec::new();
        };
        if self.session.mark_queue.is_empty() {
            return Vec::new();
        }

        let elapsed = self
            .session
            .latest_media_timestamp
            .saturating_sub(response_start);
        tracing::debug!(
            latest_ms = self.session.latest_media_timestamp,
            start_ms = response_start,
            elapsed_ms = elapsed,
            "caller interrupted, computing truncation point"
        );

        let mut actions = Vec::with_capacity(2);
        if let Some(item_id) = self.session.last_assistant_item.take() {
            tracing::info!(item_id = %item_id, audio_end_ms = elapsed, "truncating assistant item");
            actions.push(Action::Realtime(ClientEvent::ConversationItemTruncate {
                item_id,
                content_index: 0,
                audio_end_ms: elapsed,
            }));
        }
        if let Some(stream_sid) = &self.session.stream_sid {
            actions.push(Action::Telephony(OutboundFrame::clear(stream_sid)));
        }

        self.session.mark_queue.clear();
        self.session.last_assistant_item = None;
        self.session.response_start_timestamp = None;

        actions
    }

    fn acknowledge_mark(&mut self) {
        if self.session.mark_queue.pop_front().is_none() {
            tracing::trace!("ignoring mark acknowledgement with no pending marks");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telephony::{MediaChunk, StreamStart};

    fn start(sid: &str) -> InboundFrame {
        InboundFrame::Start {
            start: StreamStart {
                stream_sid: sid.to_string(),
                call_sid: None,
            },
        }
    }

    fn media(timestamp: u64) -> InboundFrame {
        InboundFrame::Media {
            media: MediaChunk {
                timestamp,
                payload: "AA==".to_string(),
            },
        }
    }

    fn delta(payload: &str, item: Option<&str>) -> ServerEvent {
        ServerEvent::AudioDelta {
            delta: payload.to_string(),
            item_id: item.map(ToString::to_string),
        }
    }

    fn mark_ack() -> InboundFrame {
        InboundFrame::Mark { mark: None }
    }

    #[test]
    fn media_updates_timestamp_and_forwards_audio() {
        let mut coordinator = Coordinator::new();
        coordinator.on_telephony(start("S1"));

        for ts in [20, 40, 60, 1000] {
            let actions = coordinator.on_telephony(media(ts));
            assert_eq!(
                actions,
                vec![Action::Realtime(ClientEvent::InputAudioAppend {
                    audio: "AA==".to_string()
                })]
            );
            assert_eq!(coordinator.session().latest_media_timestamp, ts);
        }
    }

    #[test]
    fn media_before_start_is_still_forwarded() {
        let mut coordinator = Coordinator::new();
        let actions = coordinator.on_telephony(media(40));
        assert_eq!(actions.len(), 1);
        assert_eq!(coordinator.session().latest_media_timestamp, 40);
    }

    #[test]
    fn first_delta_stamps_response_start_and_queues_mark() {
        let mut coordinator = Coordinator::new();
        coordinator.on_telephony(start("S1"));
        coordinator.on_telephony(media(0));

        let actions = coordinator.on_realtime(delta("aa", Some("I1")));

        assert_eq!(
            actions,
            vec![
                Action::Telephony(OutboundFrame::media("S1", "aa".to_string())),
                Action::Telephony(OutboundFrame::mark("S1", RESPONSE_PART_MARK)),
            ]
        );
        let session = coordinator.session();
        assert_eq!(session.response_start_timestamp, Some(0));
        assert_eq!(session.last_assistant_item.as_deref(), Some("I1"));
        assert_eq!(session.mark_queue, VecDeque::from(["responsePart".to_string()]));
    }

    #[test]
    fn later_deltas_keep_the_original_start() {
        let mut coordinator = Coordinator::new();
        coordinator.on_telephony(start("S1"));
        coordinator.on_telephony(media(100));
        coordinator.on_realtime(delta("aa", Some("I1")));
        coordinator.on_telephony(media(300));
        coordinator.on_realtime(delta("bb", None));

        let session = coordinator.session();
        assert_eq!(session.response_start_timestamp, Some(100));
        assert_eq!(session.last_assistant_item.as_deref(), Some("I1"));
        assert_eq!(session.mark_queue.len(), 2);
    }

    #[test]
    fn delta_before_start_is_dropped() {
        let mut coordinator = Coordinator::new();
        let actions = coordinator.on_realtime(delta("aa", Some("I1")));

        assert!(actions.is_empty());
        assert_eq!(coordinator.session(), &CallSession::default());
    }

    #[test]
    fn interruption_truncates_at_elapsed_playback() {
        let mut coordinator = Coordinator::new();
        coordinator.on_telephony(start("S1"));
        coordinator.on_telephony(media(1200));
        coordinator.on_realtime(delta("aa", Some("I7")));
        coordinator.on_telephony(media(2950));

        let actions = coordinator.on_realtime(ServerEvent::SpeechStarted);

        assert_eq!(
            actions,
            vec![
                Action::Realtime(ClientEvent::ConversationItemTruncate {
                    item_id: "I7".to_string(),
                    content_index: 0,
                    audio_end_ms: 1750,
                }),
                Action::Telephony(OutboundFrame::clear("S1")),
            ]
        );
        let session = coordinator.session();
        assert!(session.mark_queue.is_empty());
        assert!(session.last_assistant_item.is_none());
        assert!(session.response_start_timestamp.is_none());
    }

    #[test]
    fn interruption_without_item_still_clears_playback() {
        let mut coordinator = Coordinator::new();
        coordinator.on_telephony(start("S1"));
        coordinator.on_realtime(delta("aa", None));

        let actions = coordinator.on_realtime(ServerEvent::SpeechStarted);

        assert_eq!(actions, vec![Action::Telephony(OutboundFrame::clear("S1"))]);
        assert!(coordinator.session().mark_queue.is_empty());
    }

    #[test]
    fn interruption_with_no_pending_marks_is_a_noop() {
        let mut coordinator = Coordinator::new();
        coordinator.on_telephony(start("S1"));
        coordinator.on_realtime(delta("aa", Some("I1")));
        coordinator.on_telephony(mark_ack());
        let before = coordinator.session().clone();

        let actions = coordinator.on_realtime(ServerEvent::SpeechStarted);

        assert!(actions.is_empty());
        assert_eq!(coordinator.session(), &before);
    }

    #[test]
    fn interruption_on_idle_call_is_a_noop() {
        let mut coordinator = Coordinator::new();
        coordinator.on_telephony(start("S1"));
        assert!(coordinator.on_realtime(ServerEvent::SpeechStarted).is_empty());
    }

    #[test]
    fn extra_acks_never_underflow() {
        let mut coordinator = Coordinator::new();
        coordinator.on_telephony(start("S1"));
        coordinator.on_realtime(delta("aa", Some("I1")));
        coordinator.on_realtime(delta("bb", Some("I1")));

        for _ in 0..5 {
            assert!(coordinator.on_telephony(mark_ack()).is_empty());
        }
        assert!(coordinator.session().mark_queue.is_empty());
    }

    #[test]
    fn ack_on_empty_queue_leaves_session_untouched() {
        let mut coordinator = Coordinator::new();
        coordinator.on_telephony(start("S1"));
        coordinator.on_telephony(media(320));
        coordinator.on_realtime(delta("aa", Some("I1")));
        coordinator.on_telephony(mark_ack());
        let before = coordinator.session().clone();
        assert!(before.mark_queue.is_empty());

        assert!(coordinator.on_telephony(mark_ack()).is_empty());
        assert_eq!(coordinator.session(), &before);
    }

    #[test]
    fn restart_resets_clock_and_response() {
        let mut coordinator = Coordinator::new();
        coordinator.on_telephony(start("S1"));
        coordinator.on_telephony(media(5000));
        coordinator.on_realtime(delta("aa", Some("I1")));

        coordinator.on_telephony(start("S2"));

        let session = coordinator.session();
        assert_eq!(session.stream_sid.as_deref(), Some("S2"));
        assert_eq!(session.latest_media_timestamp, 0);
        assert!(session.response_start_timestamp.is_none());
    }

    #[test]
    fn ignored_frames_change_nothing() {
        let mut coordinator = Coordinator::new();
        coordinator.on_telephony(start("S1"));
        let before = coordinator.session().clone();

        assert!(coordinator.on_telephony(InboundFrame::Connected).is_empty());
        assert!(coordinator.on_telephony(InboundFrame::Stop).is_empty());
        assert!(coordinator.on_telephony(InboundFrame::Other("dtmf".into())).is_empty());
        assert!(coordinator.on_realtime(ServerEvent::Other("response.done".into())).is_empty());
        assert_eq!(coordinator.session(), &before);
    }
}
