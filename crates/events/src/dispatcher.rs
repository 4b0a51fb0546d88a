//! Addressed status events and the broadcast channel that carries them.
//!
//! [`StatusDispatcher`] is shared via `Arc<StatusDispatcher>` between the
//! orchestrator (producer) and the UI bridge (consumer).

use chrono::{DateTime, Utc};
use encodrop_core::job::JobStatus;
use encodrop_core::job_events::message_type;
use encodrop_core::progress::FINISHED_SENTINEL;
use encodrop_core::types::JobId;
use serde::Serialize;
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// StatusEvent
// ---------------------------------------------------------------------------

/// A status change for the job at `index`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusEvent {
    /// Addressing key of the job this event belongs to.
    pub index: JobId,

    /// The job's new status.
    pub status: JobStatus,

    /// Raw encoder text behind the event, if any: the stdout chunk for
    /// progress/finished, the failure reason for failures.
    pub detail: Option<String>,

    /// When the event was emitted (UTC).
    pub timestamp: DateTime<Utc>,
}

impl StatusEvent {
    pub fn new(index: JobId, status: JobStatus) -> Self {
        Self {
            index,
            status,
            detail: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// The `percent` text the UI keys its progress bar on.
    ///
    /// A numeric string for progress, text containing the finished sentinel
    /// for completion, `None` otherwise.
    pub fn percent_text(&self) -> Option<String> {
        match &self.status {
            JobStatus::Progress { percent } => Some(
                self.detail
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| percent.to_string()),
            ),
            JobStatus::Finished => Some(
                self.detail
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| d.contains(FINISHED_SENTINEL))
                    .unwrap_or(FINISHED_SENTINEL)
                    .to_string(),
            ),
            _ => None,
        }
    }

    /// JSON message pushed to UI clients.
    pub fn to_ui_message(&self) -> serde_json::Value {
        serde_json::json!({
            "type": message_type(&self.status),
            "index": self.index,
            "percent": self.percent_text(),
            "status": self.status,
            "timestamp": self.timestamp,
        })
    }
}

// ---------------------------------------------------------------------------
// StatusDispatcher
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fire-and-forget delivery of [`StatusEvent`]s.
///
/// No acknowledgement and no replay: events emitted while nobody is
/// subscribed are dropped, and a receiver that falls more than `capacity`
/// events behind observes `RecvError::Lagged`.
pub struct StatusDispatcher {
    sender: broadcast::Sender<StatusEvent>,
}

impl StatusDispatcher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    pub fn emit(&self, event: StatusEvent) {
        tracing::trace!(
            job_index = %event.index,
            status = event.status.label(),
            "Emitting status event",
        );
        // A SendError only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Attach a listener. Only events emitted after this call are received.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for StatusDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
