//! End-to-end runs against a real child process standing in for the encoder.
#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assert_matches::assert_matches;
use encodrop_core::job::JobStatus;
use encodrop_core::naming::{destination_path, DEFAULT_OUTPUT_SUFFIX};
use encodrop_core::registry::JobRegistry;
use encodrop_events::StatusDispatcher;
use encodrop_pipeline::{EncoderLauncher, Orchestrator, OrchestratorConfig};

/// Write an executable shell script to `dir/video_processor`.
fn fake_encoder(dir: &Path, body: &str) -> PathBuf {
    install_script(dir, "video_processor", body)
}

fn install_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    // A child shell writes the file, so this process never holds a writable
    // descriptor to it. A fork on another test thread could otherwise inherit
    // one and make the exec fail with ETXTBSY.
    let status = std::process::Command::new("/bin/sh")
        .args(["-c", "printf '%s' \"$1\" > \"$2\" && chmod 755 \"$2\"", "sh"])
        .arg(format!("#!/bin/sh\n{body}"))
        .arg(&path)
        .status()
        .expect("run /bin/sh");
    assert!(status.success(), "failed to install script");
    path
}

fn orchestrator(binary: PathBuf) -> Orchestrator<EncoderLauncher> {
    Orchestrator::new(
        EncoderLauncher::new(binary),
        Arc::new(JobRegistry::new()),
        Arc::new(StatusDispatcher::default()),
        OrchestratorConfig::default(),
    )
}

#[tokio::test]
async fn real_encoder_reports_progress_then_finished() {
    let dir = tempfile::tempdir().expect("temp dir");
    let binary = fake_encoder(
        dir.path(),
        "printf '%s' \"$3\" > \"$2\"\n\
         echo 10\nsleep 0.1\n\
         echo 50\nsleep 0.1\n\
         echo 'Finished processing. Total frames written: 3'\n\
         exit 0\n",
    );
    let orchestrator = orchestrator(binary);
    let mut rx = orchestrator.dispatcher().subscribe();

    let source = dir.path().join("clip.mp4");
    let source = source.to_str().expect("utf-8 path");
    let destination = destination_path(source, DEFAULT_OUTPUT_SUFFIX).expect("destination");
    assert!(destination.ends_with("clip_unsafe.mp4"));

    let index = orchestrator.submit(source, destination.clone()).await;
    orchestrator.wait_idle().await;

    let job = orchestrator.registry().get(index).await.expect("job");
    assert_eq!(job.status, JobStatus::Finished);

    // The encoder received (source, destination, token) in that order.
    let written = std::fs::read_to_string(&destination).expect("encoder wrote destination");
    assert_eq!(written, job.token);
    assert_eq!(job.token.len(), 20);

    let mut progress = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let JobStatus::Progress { percent } = event.status {
            progress.push(percent);
        }
    }
    assert_eq!(progress, vec![10.0, 50.0]);
}

#[tokio::test]
async fn real_encoder_non_zero_exit_fails_job() {
    let dir = tempfile::tempdir().expect("temp dir");
    let binary = fake_encoder(dir.path(), "echo 'cannot open input' >&2\nexit 1\n");
    let orchestrator = orchestrator(binary);

    let index = orchestrator.submit("/v/b.mp4", "/v/b_unsafe.mp4").await;
    orchestrator.wait_idle().await;

    assert_eq!(
        orchestrator.registry().get(index).await.expect("job").status,
        JobStatus::failed("encoder exited with code 1")
    );
}

#[tokio::test]
async fn missing_encoder_fails_job_at_launch() {
    let dir = tempfile::tempdir().expect("temp dir");
    let orchestrator = orchestrator(dir.path().join("video_processor"));
    let mut rx = orchestrator.dispatcher().subscribe();

    let index = orchestrator.submit("/v/a.mp4", "/v/a_unsafe.mp4").await;
    orchestrator.wait_idle().await;

    assert_matches!(
        orchestrator.registry().get(index).await.expect("job").status,
        JobStatus::Failed { reason } if reason.contains("not found")
    );

    let statuses: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|e| e.status.label())
        .collect();
    assert_eq!(statuses, vec!["queued", "failed"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn freshly_installed_encoders_launch_concurrently() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut orchestrators = Vec::new();
    for n in 0..8 {
        let binary = install_script(
            dir.path(),
            &format!("video_processor_{n}"),
            "echo 'Finished processing. Total frames written: 1'\nexit 0\n",
        );
        orchestrators.push(orchestrator(binary));
    }

    let mut indices = Vec::new();
    for orchestrator in &orchestrators {
        indices.push(orchestrator.submit("/v/c.mp4", "/v/c_unsafe.mp4").await);
    }
    for (orchestrator, index) in orchestrators.iter().zip(indices) {
        orchestrator.wait_idle().await;
        assert_eq!(
            orchestrator.registry().get(index).await.expect("job").status,
            JobStatus::Finished
        );
    }
}
