//! FFmpeg preflight probe.
//!
//! The encoder shells out to FFmpeg for audio muxing, so the UI warns the
//! user when `ffmpeg -version` cannot be run. Nothing in the orchestrator
//! depends on the probe result.

use std::ffi::OsStr;

/// Default FFmpeg executable, looked up on `PATH`.
pub const DEFAULT_FFMPEG_BINARY: &str = "ffmpeg";

/// Error type for the FFmpeg probe.
#[derive(Debug, thiserror::Error)]
pub enum FfmpegError {
    #[error("ffmpeg binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("ffmpeg execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },
}

/// Run `{binary} -version` and return the first line of its output.
pub async fn version(binary: impl AsRef<OsStr>) -> Result<String, FfmpegError> {
    let output = tokio::process::Command::new(binary)
        .arg("-version")
        .output()
        .await
        .map_err(FfmpegError::NotFound)?;

    if !output.status.success() {
        return Err(FfmpegError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}

/// Whether FFmpeg is installed and runnable.
pub async fn is_installed(binary: impl AsRef<OsStr>) -> bool {
    match version(binary).await {
        Ok(line) => {
            tracing::debug!(version = %line, "ffmpeg probe succeeded");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "ffmpeg probe failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    /// Install an executable shell script at `dir/name`.
    #[cfg(unix)]
    fn install_script(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        // A child shell writes the file, so this process never holds a writable
        // descriptor to it. A fork on another test thread could otherwise
        // inherit one and make the exec fail with ETXTBSY.
        let status = std::process::Command::new("/bin/sh")
            .args(["-c", "printf '%s' \"$1\" > \"$2\" && chmod 755 \"$2\"", "sh"])
            .arg(format!("#!/bin/sh\n{body}"))
            .arg(&path)
            .status()
            .expect("run /bin/sh");
        assert!(status.success(), "failed to install script");
        path
    }

    #[tokio::test]
    async fn missing_binary_is_not_found() {
        let result = version("/nonexistent/ffmpeg-binary").await;
        assert_matches!(result, Err(FfmpegError::NotFound(_)));
        assert!(!is_installed("/nonexistent/ffmpeg-binary").await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn version_line_is_returned_from_fake_binary() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = install_script(
            dir.path(),
            "ffmpeg",
            "echo 'ffmpeg version 6.1.1 Copyright (c)'\necho 'built with gcc'\n",
        );

        let line = version(&path).await.expect("probe succeeds");
        assert_eq!(line, "ffmpeg version 6.1.1 Copyright (c)");
        assert!(is_installed(&path).await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_execution_failure() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = install_script(dir.path(), "ffmpeg", "echo broken >&2\nexit 3\n");

        let result = version(&path).await;
        assert_matches!(
            result,
            Err(FfmpegError::ExecutionFailed { exit_code: Some(3), ref stderr }) if stderr.contains("broken")
        );
    }
}
