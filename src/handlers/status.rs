use axum::{extract::Extension, response::Json, routing::get, Router};
use serde_json::json;
use std::sync::Arc;

use crate::types::{ContentKind, LanguageCode};
use crate::AppState;

pub fn status_routes() -> Router {
    Router::new().route("/api/status", get(api_status))
}

async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<serde_json::Value> {
    let video = &state.config.video;
    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "models": {
            "text": state.config.gemini.text_model,
            "video": state.config.gemini.video_model,
        },
        "video_jobs": {
            "poll_interval_secs": video.poll_interval.as_secs(),
            "max_polls": video.max_polls,
        },
        "content_types": ContentKind::ALL.iter().map(|k| k.key()).collect::<Vec<_>>(),
        "languages": LanguageCode::ALL.iter().map(|l| l.code()).collect::<Vec<_>>(),
        "endpoints": {
            "generate": "/api/generate",
            "job_status": "/api/jobs/:job_id/status",
            "job_cancel": "/api/jobs/:job_id/cancel",
            "outputs": "/outputs/*",
        }
    }))
}
