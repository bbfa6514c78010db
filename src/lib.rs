// lib.rs - Marketing copy and short video generation for artisan products
pub mod capability;
pub mod config;
pub mod error;
pub mod gemini_client;
pub mod generation;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod pagination;
pub mod prompt;
pub mod schema;
pub mod studio;
pub mod types;

use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

// Re-export commonly used types for convenience
pub use error::*;
pub use types::*;

/// Shared state: explicitly constructed clients and the job registry.
pub struct AppState {
    pub config: config::Config,
    pub studio: studio::Studio,
    pub job_manager: jobs::SharedJobManager,
}

impl AppState {
    /// Wires the Gemini client into both flows.
    pub fn from_config(config: config::Config) -> Self {
        let gemini = Arc::new(gemini_client::GeminiClient::new(&config.gemini));
        let runner = Arc::new(jobs::VideoJobRunner::new(gemini.clone(), config.video.clone()));
        Self {
            studio: studio::Studio::new(gemini, runner),
            job_manager: Arc::new(jobs::JobManager::new()),
            config,
        }
    }
}

/// Builds the application with all routes and shared state.
pub fn app(state: Arc<AppState>) -> Router {
    let outputs = ServeDir::new(&state.config.video.output_dir);
    Router::new()
        .merge(handlers::generate::generate_routes())
        .merge(handlers::jobs::job_routes())
        .merge(handlers::status::status_routes())
        .nest_service("/outputs", outputs)
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BOUNDARY: &str = "craftboundary";

    fn multipart_body(fields: &[(&str, &str)]) -> Vec<u8> {
        multipart_with_image(fields, None)
    }

    fn multipart_with_image(fields: &[(&str, &str)], png: Option<&[u8]>) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some(bytes) = png {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; \
                     filename=\"lamp.png\"\r\nContent-Type: image/png\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn serve(gemini: &MockServer, dir: &tempfile::TempDir) -> String {
        let config = config::Config::from_lookup(|key| match key {
            "GEMINI_API_KEY" => Some("test-key".to_string()),
            "GEMINI_BASE_URL" => Some(gemini.uri()),
            "OUTPUT_DIR" => Some(dir.path().display().to_string()),
            "VIDEO_POLL_INTERVAL_SECS" => Some("0".to_string()),
            _ => None,
        })
        .unwrap();
        let state = Arc::new(AppState::from_config(config));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn generate_returns_bundle_and_pages() {
        let gemini = MockServer::start().await;
        let reply = json!({
            "localizedData": {
                "en": {
                    "analysis": {
                        "targetAudience": "Home decorators",
                        "sellingPoints": ["Hand-thrown clay"],
                        "sentiment": "Earthy"
                    },
                    "content": { "social": "Light up your evenings #handmade" }
                }
            }
        });
        Mock::given(method("POST"))
            .and(path("/models/gemini-3-flash-preview:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": reply.to_string() }] } }]
            })))
            .expect(1)
            .mount(&gemini)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let base = serve(&gemini, &dir).await;

        let response = reqwest::Client::new()
            .post(format!("{}/api/generate", base))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(multipart_body(&[
                ("description", "terracotta lamp"),
                ("content_types", "social"),
                ("languages", "en"),
            ]))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert!(response.headers().contains_key(middleware::logging::REQUEST_ID_HEADER));
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["availableLanguages"], json!(["en"]));
        assert_eq!(
            body["pages"],
            json!([{ "kind": "analysis" }, { "kind": "content", "contentType": "social" }])
        );
        assert_eq!(
            body["output"]["localizedData"]["en"]["content"]["social"],
            "Light up your evenings #handmade"
        );
        assert!(body["videoJobId"].is_null());
    }

    #[tokio::test]
    async fn video_job_is_followed_to_a_served_file() {
        let gemini = MockServer::start().await;
        let reply = json!({
            "localizedData": { "en": { "analysis": {
                "targetAudience": "Gift buyers",
                "sellingPoints": ["Hand-painted"],
                "sentiment": "Joyful"
            } } },
            "videoSuggestions": {
                "caption": "Glow made by hand #diwali",
                "audioSuggestion": "Soft santoor"
            }
        });
        Mock::given(method("POST"))
            .and(path("/models/gemini-3-flash-preview:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": reply.to_string() }] } }]
            })))
            .expect(1)
            .mount(&gemini)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/veo-3.1-generate-preview:predictLongRunning"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "models/veo-3.1-generate-preview/operations/op-7"
            })))
            .expect(1)
            .mount(&gemini)
            .await;
        let video_uri = format!("{}/files/lamp:download?alt=media", gemini.uri());
        Mock::given(method("GET"))
            .and(path("/models/veo-3.1-generate-preview/operations/op-7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "models/veo-3.1-generate-preview/operations/op-7",
                "done": true,
                "response": { "generateVideoResponse": {
                    "generatedSamples": [{ "video": { "uri": video_uri } }]
                } }
            })))
            .mount(&gemini)
            .await;
        Mock::given(method("GET"))
            .and(path("/files/lamp:download"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![9u8; 32]))
            .expect(1)
            .mount(&gemini)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let base = serve(&gemini, &dir).await;
        let client = reqwest::Client::new();

        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        let response = client
            .post(format!("{}/api/generate", base))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(multipart_with_image(
                &[("description", "painted clay diya"), ("content_types", "video")],
                Some(&png),
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["output"]["videoSuggestions"]["audioSuggestion"], "Soft santoor");
        let job_id = body["videoJobId"].as_str().unwrap().to_string();

        let mut status = Value::Null;
        for _ in 0..200 {
            status = client
                .get(format!("{}/api/jobs/{}/status", base, job_id))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            if status["status"] == "completed" || status["status"] == "failed" {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(status["status"], "completed", "{}", status);
        assert_eq!(status["size_bytes"], 32);

        let url = status["url"].as_str().unwrap();
        assert!(url.starts_with("/outputs/"));
        let video = client.get(format!("{}{}", base, url)).send().await.unwrap();
        assert_eq!(video.status(), 200);
        assert_eq!(video.bytes().await.unwrap().len(), 32);
    }

    #[tokio::test]
    async fn invalid_requests_never_reach_the_model() {
        let gemini = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&gemini)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let base = serve(&gemini, &dir).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{}/api/generate", base))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(multipart_body(&[("description", "wool shawl"), ("content_types", "video")]))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);

        let response = client
            .get(format!("{}/api/jobs/missing/status", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);

        let response = client
            .post(format!("{}/api/jobs/missing/cancel", base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 409);
    }

    #[tokio::test]
    async fn status_lists_models_and_kinds() {
        let gemini = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let base = serve(&gemini, &dir).await;

        let body: Value = reqwest::get(format!("{}/api/status", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["models"]["video"], config::DEFAULT_VIDEO_MODEL);
        assert_eq!(body["content_types"].as_array().unwrap().len(), 6);
        assert_eq!(body["languages"][0], "en");
    }
}
