//! Change notifications from a session to its host.
//!
//! ## Learning: Channels Instead of Callbacks
//!
//! A session storing `Box<dyn FnMut(&str)>` callbacks would have to
//! outlive, and know about, every host view. A `tokio::sync::broadcast`
//! channel turns notifications into plain values: the session sends and
//! forgets, each host holds its own receiver, and a torn-down host just
//! drops that receiver.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::toolbar::ToolbarState;

/// Capacity before slow receivers start skipping events.
const CHANNEL_CAPACITY: usize = 256;

/// Notifications emitted by a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The document changed; carries the freshly serialized HTML.
    ContentChanged(String),
    /// The derived toolbar state changed.
    ToolbarChanged(ToolbarState),
}

/// Sending half, owned by the session.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn emit(&self, event: SessionEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("no subscribers for session event");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A host-side view of the event stream that only cares about HTML.
///
/// Draft state needs the latest serialized content, not every toolbar
/// refresh, and may fall behind during bursts of typing; a missed
/// intermediate version is harmless as long as the newest one arrives.
///
/// ```ignore
/// let mut feed = ContentFeed::new(session.subscribe());
/// tokio::spawn(async move {
///     while let Some(html) = feed.next_html().await {
///         draft.content_html = html;
///     }
/// });
/// ```
pub struct ContentFeed {
    receiver: broadcast::Receiver<SessionEvent>,
}

impl ContentFeed {
    pub fn new(receiver: broadcast::Receiver<SessionEvent>) -> Self {
        Self { receiver }
    }

    /// Waits for the next content change; `None` once the session is gone.
    pub async fn next_html(&mut self) -> Option<String> {
        loop {
            match self.receiver.recv().await {
                Ok(SessionEvent::ContentChanged(html)) => return Some(html),
                Ok(SessionEvent::ToolbarChanged(_)) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "content feed fell behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// The newest content change already queued, without waiting.
    pub fn latest_html(&mut self) -> Option<String> {
        let mut latest = None;
        loop {
            match self.receiver.try_recv() {
                Ok(SessionEvent::ContentChanged(html)) => latest = Some(html),
                Ok(SessionEvent::ToolbarChanged(_)) | Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => return latest,
            }
        }
    }
}
