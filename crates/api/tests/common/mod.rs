#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use encodrop_api::config::ServerConfig;
use encodrop_api::router::build_app_router;
use encodrop_api::state::AppState;
use encodrop_api::ws::WsManager;
use encodrop_core::encoder::EncoderLocation;
use encodrop_core::registry::JobRegistry;
use encodrop_events::StatusDispatcher;
use encodrop_pipeline::{EncoderLauncher, Orchestrator};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Build a test `ServerConfig` pointing at `encoder` and `ffmpeg`.
pub fn test_config(encoder: &Path, ffmpeg: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        encoder: EncoderLocation::Explicit(encoder.to_path_buf()),
        output_suffix: "_unsafe".to_string(),
        token_length: 20,
        max_concurrent_jobs: None,
        finish_on_clean_exit: false,
        ffmpeg_path: ffmpeg.to_string(),
    }
}

/// Build shared state for `config`, wiring the orchestrator to the real
/// encoder launcher.
pub fn test_state(config: ServerConfig) -> AppState {
    let encoder = config.encoder.resolve().expect("explicit encoder path");
    let orchestrator = Orchestrator::new(
        EncoderLauncher::new(encoder),
        Arc::new(JobRegistry::new()),
        Arc::new(StatusDispatcher::default()),
        config.orchestrator_config(),
    );

    AppState {
        config: Arc::new(config),
        orchestrator: Arc::new(orchestrator),
        ws_manager: Arc::new(WsManager::new()),
    }
}

/// Full application router plus the state behind it.
pub fn build_test_app(config: ServerConfig) -> (Router, AppState) {
    let state = test_state(config.clone());
    let app = build_app_router(state.clone(), &config);
    (app, state)
}

/// Router whose encoder and FFmpeg binaries do not exist.
pub fn build_offline_app() -> (Router, AppState) {
    build_test_app(test_config(
        Path::new("/nonexistent/video_processor"),
        "/nonexistent/ffmpeg",
    ))
}

/// Write an executable shell script named `name` into `dir`.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
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

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
