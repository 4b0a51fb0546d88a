//! In-memory job registry.
//!
//! Jobs are appended in creation order and addressed by [`JobId`]. The
//! registry is never reordered or compacted, so an id handed to the UI stays
//! valid for the lifetime of the process. It is the only state shared by
//! concurrently running job handlers; each handler only writes its own entry.

use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::job::{Job, JobStatus};
use crate::types::JobId;

#[derive(Default)]
struct Inner {
    jobs: IndexMap<JobId, Job>,
    next_id: u64,
}

/// Thread-safe, insertion-ordered collection of [`Job`] records.
///
/// Designed to be wrapped in `Arc` and shared between the orchestrator's
/// per-job tasks and the API handlers.
#[derive(Default)]
pub struct JobRegistry {
    inner: RwLock<Inner>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new `Queued` job and return its id.
    pub async fn create(
        &self,
        source_path: impl Into<String>,
        destination_path: impl Into<String>,
        token: impl Into<String>,
    ) -> JobId {
        let mut inner = self.inner.write().await;
        let index = JobId::new(inner.next_id);
        inner.next_id += 1;

        let now = chrono::Utc::now();
        inner.jobs.insert(
            index,
            Job {
                index,
                source_path: source_path.into(),
                destination_path: destination_path.into(),
                token: token.into(),
                status: JobStatus::Queued,
                created_at: now,
                updated_at: now,
            },
        );
        index
    }

    /// Return a snapshot of the job at `index`.
    pub async fn get(&self, index: JobId) -> Result<Job, CoreError> {
        self.inner
            .read()
            .await
            .jobs
            .get(&index)
            .cloned()
            .ok_or(not_found(index))
    }

    /// Overwrite the status of the job at `index`.
    ///
    /// Transitions are not validated; callers only ever move forward.
    pub async fn update_status(&self, index: JobId, status: JobStatus) -> Result<(), CoreError> {
        let mut inner = self.inner.write().await;
        let job = inner.jobs.get_mut(&index).ok_or(not_found(index))?;
        job.status = status;
        job.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Snapshot of every job in creation order.
    pub async fn list(&self) -> Vec<Job> {
        self.inner.read().await.jobs.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.jobs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn not_found(index: JobId) -> CoreError {
    CoreError::NotFound {
        entity: "Job",
        id: index,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn create_assigns_increasing_ids_from_zero() {
        let registry = JobRegistry::new();

        let a = registry.create("/v/a.mp4", "/v/a_unsafe.mp4", "tok-a").await;
        let b = registry.create("/v/b.mp4", "/v/b_unsafe.mp4", "tok-b").await;
        let c = registry.create("/v/c.mp4", "/v/c_unsafe.mp4", "tok-c").await;

        assert_eq!(a, JobId::new(0));
        assert_eq!(b, JobId::new(1));
        assert_eq!(c, JobId::new(2));
        assert_eq!(registry.len().await, 3);
    }

    #[tokio::test]
    async fn new_job_is_queued_with_given_fields() {
        let registry = JobRegistry::new();
        let index = registry.create("/v/a.mp4", "/v/a_unsafe.mp4", "abc123").await;

        let job = registry.get(index).await.expect("job exists");
        assert_eq!(job.index, index);
        assert_eq!(job.source_path, "/v/a.mp4");
        assert_eq!(job.destination_path, "/v/a_unsafe.mp4");
        assert_eq!(job.token, "abc123");
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.created_at, job.updated_at);
    }

    #[tokio::test]
    async fn get_unknown_index_is_not_found() {
        let registry = JobRegistry::new();
        registry.create("/v/a.mp4", "/v/a_unsafe.mp4", "t").await;

        let err = registry.get(JobId::new(5)).await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { entity: "Job", id } if id == JobId::new(5));
    }

    #[tokio::test]
    async fn update_status_overwrites_without_validation() {
        let registry = JobRegistry::new();
        let index = registry.create("/v/a.mp4", "/v/a_unsafe.mp4", "t").await;

        registry
            .update_status(index, JobStatus::Progress { percent: 55.0 })
            .await
            .expect("update");
        registry
            .update_status(index, JobStatus::Progress { percent: 10.0 })
            .await
            .expect("update");

        let job = registry.get(index).await.expect("job exists");
        assert_eq!(job.status, JobStatus::Progress { percent: 10.0 });
        assert!(job.updated_at >= job.created_at);
    }

    #[tokio::test]
    async fn update_unknown_index_is_not_found() {
        let registry = JobRegistry::new();
        let result = registry
            .update_status(JobId::new(0), JobStatus::Running)
            .await;
        assert_matches!(result, Err(CoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn failed_jobs_keep_their_slot() {
        let registry = JobRegistry::new();
        let a = registry.create("/v/a.mp4", "/v/a_unsafe.mp4", "t").await;
        registry
            .update_status(a, JobStatus::failed("spawn failed"))
            .await
            .expect("update");

        let b = registry.create("/v/b.mp4", "/v/b_unsafe.mp4", "t").await;
        assert_eq!(b, JobId::new(1));

        let listed: Vec<JobId> = registry.list().await.iter().map(|j| j.index).collect();
        assert_eq!(listed, vec![JobId::new(0), JobId::new(1)]);
    }

    #[tokio::test]
    async fn concurrent_creates_yield_unique_ids() {
        let registry = Arc::new(JobRegistry::new());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    registry
                        .create(format!("/v/{i}.mp4"), format!("/v/{i}_unsafe.mp4"), "t")
                        .await
                })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.expect("task").get());
        }
        ids.sort_unstable();
        assert_eq!(ids, (0..32).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn empty_registry() {
        let registry = JobRegistry::new();
        assert!(registry.is_empty().await);
        assert!(registry.list().await.is_empty());
    }
}
