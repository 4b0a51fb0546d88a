//! Job record and status model.

use serde::Serialize;

use crate::progress::ProgressEvent;
use crate::types::{JobId, Timestamp};

/// Lifecycle status of a single encoding job.
///
/// `Queued -> Running -> Progress* -> Finished`, or `-> Failed` from
/// Queued/Running. Progress values are surfaced in arrival order and may go
/// backwards. `Finished` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Progress { percent: f64 },
    Finished,
    Failed { reason: String },
}

impl JobStatus {
    /// Whether no further updates are processed for a job in this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Failed { .. })
    }

    /// Short lowercase label, used in logs and UI message types.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Progress { .. } => "progress",
            Self::Finished => "finished",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

impl From<ProgressEvent> for JobStatus {
    fn from(event: ProgressEvent) -> Self {
        match event {
            ProgressEvent::Progress { percent } => Self::Progress { percent },
            ProgressEvent::Finished => Self::Finished,
        }
    }
}

/// One dropped file's end-to-end encoding task.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub index: JobId,
    pub source_path: String,
    pub destination_path: String,
    pub token: String,
    pub status: JobStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
