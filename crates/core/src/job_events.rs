//! WebSocket message type constants for job status events.
//!
//! Used by the API's status forwarder when pushing job lifecycle updates to
//! the connected UI.

use crate::job::JobStatus;

/// The job's encoder process was started.
pub const MSG_TYPE_JOB_RUNNING: &str = "job_running";

/// Percentage update during encoding.
pub const MSG_TYPE_JOB_PROGRESS: &str = "job_progress";

/// The encoder reported completion.
pub const MSG_TYPE_JOB_FINISHED: &str = "job_finished";

/// The encoder could not be started or exited with a failure code.
pub const MSG_TYPE_JOB_FAILED: &str = "job_failed";

/// The job was accepted and is waiting to be launched.
pub const MSG_TYPE_JOB_QUEUED: &str = "job_queued";

/// Message type for a status.
pub fn message_type(status: &JobStatus) -> &'static str {
    match status {
        JobStatus::Queued => MSG_TYPE_JOB_QUEUED,
        JobStatus::Running => MSG_TYPE_JOB_RUNNING,
        JobStatus::Progress { .. } => MSG_TYPE_JOB_PROGRESS,
        JobStatus::Finished => MSG_TYPE_JOB_FINISHED,
        JobStatus::Failed { .. } => MSG_TYPE_JOB_FAILED,
    }
}
