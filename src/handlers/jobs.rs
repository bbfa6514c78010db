// src/handlers/jobs.rs
//! Video job endpoints - status and cancel

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use crate::AppState;
use crate::jobs::{JobId, VideoJobRecord};

#[derive(Serialize)]
pub struct JobStatusResponse {
    #[serde(flatten)]
    pub job: VideoJobRecord,
    pub message: String,
}

/// GET /api/jobs/:job_id/status - Get job status
pub async fn get_job_status(
    Path(job_id): Path<JobId>,
    Extension(state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    match state.job_manager.get_job(&job_id).await {
        Some(job) => {
            let response = JobStatusResponse {
                job,
                message: "Job status retrieved".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Job not found" })),
        )
            .into_response(),
    }
}

/// POST /api/jobs/:job_id/cancel - Abort a running video job
pub async fn cancel_job(
    Path(job_id): Path<JobId>,
    Extension(state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    match state.job_manager.cancel_job(&job_id).await {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(serde_json::json!({ "job_id": job_id, "message": "Cancellation requested" })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Failed to cancel job {}: {}", job_id, e);
            (StatusCode::CONFLICT, Json(serde_json::json!({ "error": e }))).into_response()
        }
    }
}

/// Routes for job management
pub fn job_routes() -> Router {
    Router::new()
        .route("/api/jobs/:job_id/status", get(get_job_status))
        .route("/api/jobs/:job_id/cancel", post(cancel_job))
}
