//! Channel-backed view of one call leg's socket
//!
//! The relay never touches a socket directly. Each socket is split into a
//! reader task that pushes text frames into `inbound` and a writer task that
//! drains `outbound`; when the reader's sender drops, the leg is closed.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Queue depth per direction
pub const LEG_CAPACITY: usize = 256;

/// How long a writer gets to flush and send its close frame on teardown
const WRITER_DRAIN: Duration = Duration::from_secs(1);

/// Relay-side end of a call leg
#[derive(Debug)]
pub struct Leg {
    name: &'static str,
    inbound: mpsc::Receiver<String>,
    outbound: mpsc::Sender<String>,
    reader: Option<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

/// Socket-side end of a call leg, owned by the pump tasks (or by a test)
#[derive(Debug)]
pub struct LegPeer {
    /// Frames read from the socket, delivered to the relay
    pub to_relay: mpsc::Sender<String>,
    /// Frames the relay wants written to the socket
    pub from_relay: mpsc::Receiver<String>,
}

impl Leg {
    /// Create a connected leg and peer
    #[must_use]
    pub fn pair(name: &'static str) -> (Self, LegPeer) {
        let (to_relay, inbound) = mpsc::channel(LEG_CAPACITY);
        let (outbound, from_relay) = mpsc::channel(LEG_CAPACITY);
        let leg = Self {
            name,
            inbound,
            outbound,
            reader: None,
            writer: None,
        };
        (leg, LegPeer { to_relay, from_relay })
    }

    /// Attach the pump tasks so teardown can stop them
    #[must_use]
    pub fn with_tasks(mut self, reader: JoinHandle<()>, writer: JoinHandle<()>) -> Self {
        self.reader = Some(reader);
        self.writer = Some(writer);
        self
    }

    /// Leg name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Next inbound frame, `None` once the socket is gone
    pub async fn recv(&mut self) -> Option<String> {
        self.inbound.recv().await
    }

    /// Queue a frame for the socket without waiting on the writer
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::LegClosed`] if the writer has stopped and
    /// [`crate::Error::LegBackedUp`] if its queue is full
    pub fn send(&self, text: String) -> crate::Result<()> {
        self.outbound.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => crate::Error::LegBackedUp(self.name),
            mpsc::error::TrySendError::Closed(_) => crate::Error::LegClosed(self.name),
        })
    }

    /// Stop both directions
    ///
    /// Dropping the outbound sender lets the writer flush and close its socket.
    /// The reader is aborted since the far side may never send again.
    pub async fn close(self) {
        let Self {
            name,
            inbound,
            outbound,
            reader,
            writer,
        } = self;
        drop(outbound);
        drop(inbound);

        if let Some(writer) = writer
            && tokio::time::timeout(WRITER_DRAIN, writer).await.is_err()
        {
            tracing::debug!(leg = name, "writer did not drain before teardown");
        }
        if let Some(reader) = reader {
            reader.abort();
        }
        tracing::debug!(leg = name, "leg closed");
    }
}
