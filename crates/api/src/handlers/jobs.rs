//! Handlers for the `/jobs` resource.
//!
//! Dropping files creates one job per path and launches its encoder in the
//! background; the response returns as soon as the jobs are registered.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use encodrop_core::naming::destination_path;
use encodrop_core::types::JobId;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /api/v1/jobs`.
#[derive(Debug, Deserialize)]
pub struct SubmitJobs {
    /// Absolute paths of the dropped files, in drop order.
    pub paths: Vec<String>,
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

/// POST /api/v1/jobs
///
/// Create and launch one job per dropped path. Returns 201 with the created
/// jobs in drop order. Destinations are derived for every path before any
/// job is created, so a bad path rejects the whole drop.
pub async fn submit_jobs(
    State(state): State<AppState>,
    Json(input): Json<SubmitJobs>,
) -> AppResult<impl IntoResponse> {
    if input.paths.is_empty() {
        return Err(AppError::BadRequest("paths must not be empty".into()));
    }

    let mut planned = Vec::with_capacity(input.paths.len());
    for source in input.paths {
        if source.trim().is_empty() {
            return Err(AppError::BadRequest("paths must not contain empty entries".into()));
        }
        let destination = destination_path(&source, &state.config.output_suffix)?;
        planned.push((source, destination));
    }

    let mut jobs = Vec::with_capacity(planned.len());
    for (source, destination) in planned {
        let index = state.orchestrator.submit(source, destination).await;
        jobs.push(state.orchestrator.registry().get(index).await?);
    }

    tracing::info!(count = jobs.len(), "Files dropped");

    Ok((StatusCode::CREATED, Json(DataResponse { data: jobs })))
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs
///
/// All jobs in creation order.
pub async fn list_jobs(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let jobs = state.orchestrator.registry().list().await;
    Ok(Json(DataResponse { data: jobs }))
}

// ---------------------------------------------------------------------------
// Get
// ---------------------------------------------------------------------------

/// GET /api/v1/jobs/{index}
pub async fn get_job(
    State(state): State<AppState>,
    Path(index): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let job = state.orchestrator.registry().get(index).await?;
    Ok(Json(DataResponse { data: job }))
}
