//! Job orchestrator.
//!
//! One Tokio task per job owns that job's encoder event stream, so status
//! changes for a job are applied and emitted in the order the encoder
//! produced them. Tasks for different jobs share only the registry and the
//! dispatcher and never touch each other's entries.
//!
//! Launching is unbounded unless [`OrchestratorConfig::max_concurrent_jobs`]
//! is set, in which case a job stays `Queued` until a slot frees up. There
//! is no cancellation and no retry.

use std::collections::HashSet;
use std::sync::Arc;

use encodrop_core::error::CoreError;
use encodrop_core::job::JobStatus;
use encodrop_core::progress::parse_chunk;
use encodrop_core::registry::JobRegistry;
use encodrop_core::token::{generate_token, DEFAULT_TOKEN_LENGTH};
use encodrop_core::types::JobId;
use encodrop_events::{StatusDispatcher, StatusEvent};
use tokio::sync::{watch, Mutex, Semaphore};

use crate::launcher::{JobHandle, ProcessEvent, ProcessLauncher};

/// Tunables for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Length of the per-job token passed to the encoder.
    pub token_length: usize,
    /// Maximum number of encoder processes alive at once. `None` launches
    /// every job immediately.
    pub max_concurrent_jobs: Option<usize>,
    /// Mark a job `Finished` when its encoder exits with code 0 without
    /// printing the finished sentinel. Off by default: such a job keeps
    /// whatever status its last progress chunk set.
    pub finish_on_clean_exit: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            token_length: DEFAULT_TOKEN_LENGTH,
            max_concurrent_jobs: None,
            finish_on_clean_exit: false,
        }
    }
}

struct Shared<L> {
    registry: Arc<JobRegistry>,
    dispatcher: Arc<StatusDispatcher>,
    launcher: L,
    limiter: Option<Arc<Semaphore>>,
    config: OrchestratorConfig,
    launched: Mutex<HashSet<JobId>>,
}

/// Creates jobs, launches their encoders and routes their status events.
pub struct Orchestrator<L> {
    shared: Arc<Shared<L>>,
    running: Arc<watch::Sender<usize>>,
}

/// Counts one job task as running until dropped.
struct RunningGuard(Arc<watch::Sender<usize>>);

impl RunningGuard {
    fn enter(running: &Arc<watch::Sender<usize>>) -> Self {
        running.send_modify(|n| *n += 1);
        Self(Arc::clone(running))
    }
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n -= 1);
    }
}

impl<L: ProcessLauncher> Orchestrator<L> {
    pub fn new(
        launcher: L,
        registry: Arc<JobRegistry>,
        dispatcher: Arc<StatusDispatcher>,
        config: OrchestratorConfig,
    ) -> Self {
        let limiter = config
            .max_concurrent_jobs
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));

        Self {
            shared: Arc::new(Shared {
                registry,
                dispatcher,
                launcher,
                limiter,
                config,
                launched: Mutex::new(HashSet::new()),
            }),
            running: Arc::new(watch::Sender::new(0)),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.shared.registry
    }

    pub fn dispatcher(&self) -> &Arc<StatusDispatcher> {
        &self.shared.dispatcher
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.shared.config
    }

    pub fn launcher(&self) -> &L {
        &self.shared.launcher
    }

    /// Register a new `Queued` job with a fresh token.
    pub async fn create_job(
        &self,
        source_path: impl Into<String>,
        destination_path: impl Into<String>,
    ) -> JobId {
        let token = generate_token(self.shared.config.token_length);
        let index = self
            .shared
            .registry
            .create(source_path, destination_path, token)
            .await;

        tracing::info!(job_index = %index, "Job created");
        self.shared
            .dispatcher
            .emit(StatusEvent::new(index, JobStatus::Queued));
        index
    }

    /// Start the encoder for a `Queued` job in the background.
    ///
    /// Returns once the job task is spawned; it does not wait for the
    /// encoder. A job can be launched at most once.
    pub async fn launch(&self, index: JobId) -> Result<(), CoreError> {
        let job = self.shared.registry.get(index).await?;

        if !self.shared.launched.lock().await.insert(index) {
            return Err(CoreError::Validation(format!(
                "job {index} has already been launched"
            )));
        }
        if job.status != JobStatus::Queued {
            return Err(CoreError::Validation(format!(
                "job {index} is {} and cannot be launched",
                job.status.label()
            )));
        }

        let shared = Arc::clone(&self.shared);
        let guard = RunningGuard::enter(&self.running);
        tokio::spawn(async move {
            let _guard = guard;
            shared.run_job(index).await;
        });
        Ok(())
    }

    /// Create a job for a dropped file and launch it immediately.
    pub async fn submit(
        &self,
        source_path: impl Into<String>,
        destination_path: impl Into<String>,
    ) -> JobId {
        let index = self.create_job(source_path, destination_path).await;
        if let Err(e) = self.launch(index).await {
            // Unreachable for a job created just above.
            tracing::error!(job_index = %index, error = %e, "Failed to launch new job");
        }
        index
    }

    /// Number of job tasks still running.
    pub fn active_jobs(&self) -> usize {
        *self.running.borrow()
    }

    /// Wait until no job task is running.
    ///
    /// Any number of callers may wait at once, and dropping the future
    /// leaves nothing behind. Jobs launched while waiting extend the wait.
    pub async fn wait_idle(&self) {
        let mut rx = self.running.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|running| *running == 0).await;
    }
}

impl<L: ProcessLauncher> Shared<L> {
    async fn run_job(&self, index: JobId) {
        // Held until the encoder exits.
        let _permit = match &self.limiter {
            Some(limiter) => match Arc::clone(limiter).acquire_owned().await {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::error!(job_index = %index, "Concurrency limiter closed");
                    return;
                }
            },
            None => None,
        };

        let job = match self.registry.get(index).await {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(job_index = %index, error = %e, "Job vanished before launch");
                return;
            }
        };

        let handle = match self
            .launcher
            .launch(&job.source_path, &job.destination_path, &job.token)
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                tracing::error!(job_index = %index, error = %e, "Encoder failed to start");
                let reason = format!("failed to start encoder: {e}");
                self.transition(index, JobStatus::failed(reason.clone()), Some(reason))
                    .await;
                return;
            }
        };

        tracing::info!(job_index = %index, pid = handle.pid(), "Encoder started");
        self.transition(index, JobStatus::Running, None).await;
        self.follow(index, handle).await;
    }

    /// Consume one encoder's events until it exits.
    async fn follow(&self, index: JobId, mut handle: JobHandle) {
        let mut current = JobStatus::Running;

        loop {
            let Some(event) = handle.next_event().await else {
                if !current.is_terminal() {
                    let reason = "encoder event stream closed before exit".to_string();
                    tracing::error!(job_index = %index, "{reason}");
                    self.transition(index, JobStatus::failed(reason.clone()), Some(reason))
                        .await;
                }
                return;
            };

            match event {
                ProcessEvent::Stdout(chunk) => {
                    tracing::debug!(job_index = %index, chunk = %chunk.trim_end(), "Encoder stdout");
                    if current.is_terminal() {
                        tracing::trace!(job_index = %index, "Ignoring output after terminal status");
                        continue;
                    }
                    match parse_chunk(&chunk) {
                        Some(progress) => {
                            let status = JobStatus::from(progress);
                            current = status.clone();
                            self.transition(index, status, Some(chunk)).await;
                        }
                        None => {
                            tracing::trace!(job_index = %index, "Discarding non-progress output");
                        }
                    }
                }
                ProcessEvent::Stderr(chunk) => {
                    let text = chunk.trim_end();
                    if !text.is_empty() {
                        tracing::warn!(job_index = %index, stderr = %text, "Encoder stderr");
                    }
                }
                ProcessEvent::Exited { code } => {
                    self.on_exit(index, &current, code).await;
                    return;
                }
            }
        }
    }

    async fn on_exit(&self, index: JobId, current: &JobStatus, code: Option<i32>) {
        match code {
            Some(0) => {
                tracing::info!(job_index = %index, status = current.label(), "Encoder exited cleanly");
                if current.is_terminal() {
                    return;
                }
                if self.config.finish_on_clean_exit {
                    self.transition(index, JobStatus::Finished, None).await;
                } else {
                    tracing::warn!(
                        job_index = %index,
                        status = current.label(),
                        "Encoder exited with code 0 without reporting completion; status left unchanged",
                    );
                }
            }
            other => {
                let reason = match other {
                    Some(code) => format!("encoder exited with code {code}"),
                    None => "encoder terminated by signal".to_string(),
                };
                if current.is_terminal() {
                    tracing::warn!(job_index = %index, reason = %reason, "Encoder failed after reporting completion");
                    return;
                }
                tracing::error!(job_index = %index, reason = %reason, "Encoder failed");
                self.transition(index, JobStatus::failed(reason.clone()), Some(reason))
                    .await;
            }
        }
    }

    /// Record `status` for `index` and emit it. Nothing is emitted if the
    /// registry does not know the index.
    async fn transition(&self, index: JobId, status: JobStatus, detail: Option<String>) {
        if let Err(e) = self.registry.update_status(index, status.clone()).await {
            tracing::error!(job_index = %index, error = %e, "Status update for unknown job");
            return;
        }

        let mut event = StatusEvent::new(index, status);
        if let Some(detail) = detail {
            event = event.with_detail(detail);
        }
        self.dispatcher.emit(event);
    }
}
