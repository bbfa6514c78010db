// src/handlers/generate.rs
//! POST /api/generate - marketing copy for an artisan product, plus an
//! optional background video job.

use axum::{
    extract::{multipart::Multipart, DefaultBodyLimit, Extension},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::{GenerationError, RequestError};
use crate::pagination::{OutputLayout, OutputPage};
use crate::studio::CampaignRequest;
use crate::types::{GenerationBundle, ImageInput, LanguageCode};
use crate::AppState;

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub fn generate_routes() -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    pub output: Option<GenerationBundle>,
    pub available_languages: Vec<LanguageCode>,
    pub pages: Vec<OutputPage>,
    pub video_job_id: Option<String>,
    pub error: Option<String>,
}

pub async fn generate(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> Response {
    let request = match read_campaign_request(multipart).await {
        Ok(request) => request,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };
    let outcome = match state.studio.run_campaign(&request, &state.job_manager).await {
        Ok(outcome) => outcome,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let (status, response) = build_response(outcome.content, outcome.video_job);
    (status, Json(response)).into_response()
}

fn build_response(
    result: Result<GenerationBundle, GenerationError>,
    video_job_id: Option<String>,
) -> (StatusCode, GenerateResponse) {
    match result {
        Ok(bundle) => {
            let layout = OutputLayout::derive(&bundle);
            (
                StatusCode::OK,
                GenerateResponse {
                    success: true,
                    available_languages: layout.available_languages,
                    pages: layout.pages,
                    output: Some(bundle),
                    video_job_id,
                    error: None,
                },
            )
        }
        Err(e) => {
            let status = match e {
                GenerationError::Service(_) => StatusCode::BAD_GATEWAY,
                GenerationError::EmptyResponse | GenerationError::MalformedResponse(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            };
            (
                status,
                GenerateResponse {
                    success: false,
                    output: None,
                    available_languages: Vec::new(),
                    pages: Vec::new(),
                    video_job_id,
                    error: Some(e.to_string()),
                },
            )
        }
    }
}

async fn read_campaign_request(mut multipart: Multipart) -> Result<CampaignRequest, String> {
    let mut request = CampaignRequest {
        description: String::new(),
        image: None,
        content_kinds: Vec::new(),
        languages: Vec::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Invalid multipart body: {}", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                let declared = field.content_type().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| format!("Failed to read image: {}", e))?;
                if !bytes.is_empty() {
                    request.image = Some(ImageInput::new(bytes.to_vec(), declared.as_deref()));
                }
            }
            "description" | "content_types" | "languages" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| format!("Failed to read field '{}': {}", name, e))?;
                apply_text_field(&mut request, &name, &text).map_err(|e| e.to_string())?;
            }
            other => tracing::debug!("Ignoring unknown multipart field '{}'", other),
        }
    }

    Ok(request)
}

/// Lists may arrive as repeated fields or comma separated.
fn apply_text_field(
    request: &mut CampaignRequest,
    name: &str,
    text: &str,
) -> Result<(), RequestError> {
    let items = || text.split(',').map(str::trim).filter(|item| !item.is_empty());
    match name {
        "description" => request.description = text.trim().to_string(),
        "content_types" => {
            for item in items() {
                request.content_kinds.push(item.parse()?);
            }
        }
        "languages" => {
            for item in items() {
                request.languages.push(item.parse()?);
            }
        }
        _ => {}
    }
    Ok(())
}

fn error_response(status: StatusCode, message: String) -> Response {
    tracing::warn!("Rejected generation request: {}", message);
    (
        status,
        Json(serde_json::json!({ "success": false, "error": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentKind;

    fn empty_request() -> CampaignRequest {
        CampaignRequest {
            description: String::new(),
            image: None,
            content_kinds: Vec::new(),
            languages: Vec::new(),
        }
    }

    #[test]
    fn text_fields_accept_repeated_and_comma_separated_lists() {
        let mut request = empty_request();
        apply_text_field(&mut request, "description", "  clay lamp ").unwrap();
        apply_text_field(&mut request, "content_types", "social, blog").unwrap();
        apply_text_field(&mut request, "content_types", "video").unwrap();
        apply_text_field(&mut request, "languages", "hi,,ta").unwrap();

        assert_eq!(request.description, "clay lamp");
        assert_eq!(
            request.content_kinds,
            vec![ContentKind::Social, ContentKind::Blog, ContentKind::Video]
        );
        assert_eq!(request.languages, vec![LanguageCode::Hi, LanguageCode::Ta]);
    }

    #[test]
    fn unknown_values_are_rejected() {
        let mut request = empty_request();
        let err = apply_text_field(&mut request, "languages", "en, fr").unwrap_err();
        assert_eq!(err, RequestError::UnknownLanguage("fr".to_string()));
    }

    #[test]
    fn failed_generation_keeps_video_job_id() {
        let (status, response) = build_response(
            Err(GenerationError::EmptyResponse),
            Some("job-1".to_string()),
        );
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!response.success);
        assert_eq!(response.video_job_id.as_deref(), Some("job-1"));
        assert!(response.pages.is_empty());
    }
}
