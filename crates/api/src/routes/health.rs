use axum::extract::State;
use axum::{routing::get, Json, Router};
use encodrop_core::ffmpeg;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok` when the encoder and FFmpeg are both usable, `degraded` otherwise.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether `ffmpeg -version` ran successfully.
    pub ffmpeg_installed: bool,
    /// Whether the resolved encoder binary exists on disk.
    pub encoder_found: bool,
    /// Number of job tasks still running.
    pub active_jobs: usize,
}

/// GET /health -- bridge health plus the FFmpeg preflight probe.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let ffmpeg_installed = ffmpeg::is_installed(&state.config.ffmpeg_path).await;
    let encoder_found = state.orchestrator.launcher().binary().is_file();

    let status = if ffmpeg_installed && encoder_found {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        ffmpeg_installed,
        encoder_found,
        active_jobs: state.orchestrator.active_jobs(),
    })
}

/// Mount health check routes (root level, not under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
