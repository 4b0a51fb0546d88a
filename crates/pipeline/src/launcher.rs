//! External encoder process launcher.
//!
//! [`EncoderLauncher`] starts the encoder with three positional arguments
//! (source, destination, token) and hands back a [`JobHandle`] whose event
//! stream carries, in order:
//!
//! - stdout chunks as they are read (arbitrary fragments, not lines),
//! - stderr chunks (diagnostic only),
//! - exactly one [`ProcessEvent::Exited`], sent after both pipes are drained.
//!
//! There is no timeout and no kill-on-drop: once started, the encoder runs
//! until it exits on its own.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;

/// Size of a single read from the encoder's stdout/stderr pipes.
const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Something observed on a running encoder process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// A fragment of text read from stdout.
    Stdout(String),
    /// A fragment of text read from stderr.
    Stderr(String),
    /// The process exited. `None` if it was terminated by a signal or its
    /// status could not be collected.
    Exited { code: Option<i32> },
}

/// Errors that prevent the encoder from being started.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("encoder binary not found: {0}")]
    NotFound(String),

    #[error("permission denied starting encoder: {0}")]
    PermissionDenied(String),

    #[error("failed to spawn encoder: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to one launched encoder process.
#[derive(Debug)]
pub struct JobHandle {
    pid: Option<u32>,
    events: mpsc::UnboundedReceiver<ProcessEvent>,
}

impl JobHandle {
    /// Wrap an event stream. Launchers other than [`EncoderLauncher`] build
    /// handles this way.
    pub fn new(pid: Option<u32>, events: mpsc::UnboundedReceiver<ProcessEvent>) -> Self {
        Self { pid, events }
    }

    /// OS process id, if known.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Next event in emission order; `None` once the stream is closed.
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        self.events.recv().await
    }
}

/// Starts encoder processes for jobs.
pub trait ProcessLauncher: Send + Sync + 'static {
    /// Start the encoder for one job.
    ///
    /// A spawn failure is returned here and is never followed by events.
    fn launch(
        &self,
        source_path: &str,
        destination_path: &str,
        token: &str,
    ) -> impl Future<Output = Result<JobHandle, LaunchError>> + Send;
}

/// Launcher for the real `video_processor` binary.
#[derive(Debug, Clone)]
pub struct EncoderLauncher {
    binary: PathBuf,
}

impl EncoderLauncher {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl ProcessLauncher for EncoderLauncher {
    async fn launch(
        &self,
        source_path: &str,
        destination_path: &str,
        token: &str,
    ) -> Result<JobHandle, LaunchError> {
        tracing::info!(
            binary = %self.binary.display(),
            source = source_path,
            destination = destination_path,
            token,
            "Launching encoder",
        );

        let mut child = Command::new(&self.binary)
            .args([source_path, destination_path, token])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| classify_spawn_error(&self.binary, e))?;

        let pid = child.id();
        let (tx, rx) = mpsc::unbounded_channel();

        let stdout_task = tokio::spawn(forward_stream(
            child.stdout.take(),
            tx.clone(),
            ProcessEvent::Stdout,
        ));
        let stderr_task = tokio::spawn(forward_stream(
            child.stderr.take(),
            tx.clone(),
            ProcessEvent::Stderr,
        ));

        tokio::spawn(async move {
            let code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    tracing::error!(pid, error = %e, "Failed to collect encoder exit status");
                    None
                }
            };

            // Both pipes must be drained before the exit event so that no
            // stdout chunk is observed after it.
            let _ = stdout_task.await;
            let _ = stderr_task.await;

            let _ = tx.send(ProcessEvent::Exited { code });
        });

        Ok(JobHandle::new(pid, rx))
    }
}

fn classify_spawn_error(binary: &Path, err: std::io::Error) -> LaunchError {
    match err.kind() {
        std::io::ErrorKind::NotFound => LaunchError::NotFound(binary.display().to_string()),
        std::io::ErrorKind::PermissionDenied => {
            LaunchError::PermissionDenied(binary.display().to_string())
        }
        _ => LaunchError::Io(err),
    }
}

/// Read `handle` in chunks and forward each chunk as an event until EOF.
async fn forward_stream<R: AsyncRead + Unpin>(
    handle: Option<R>,
    tx: mpsc::UnboundedSender<ProcessEvent>,
    wrap: fn(String) -> ProcessEvent,
) {
    let Some(mut reader) = handle else {
        return;
    };

    let mut buf = vec![0u8; READ_CHUNK_BYTES];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = String::from_utf8_lossy(&buf[..n]).into_owned();
                if tx.send(wrap(chunk)).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(error = %e, "Encoder pipe read failed");
                break;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
