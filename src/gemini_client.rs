use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::capability::{InstructionPart, StructuredGenerator, VideoGenerator, VideoOperation};
use crate::config::GeminiConfig;
use crate::error::ServiceError;
use crate::schema::Schema;
use crate::types::ImageInput;

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    video_model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest<'a> {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String, // base64 encoded data
}

impl From<&InstructionPart> for Part {
    fn from(part: &InstructionPart) -> Self {
        match part {
            InstructionPart::Text(text) => Part::Text { text: text.clone() },
            InstructionPart::Image(image) => Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: BASE64_STANDARD.encode(&image.bytes),
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerationConfig<'a> {
    pub temperature: f32,
    #[serde(rename = "responseMimeType")]
    pub response_mime_type: &'static str,
    #[serde(rename = "responseSchema")]
    pub response_schema: &'a Schema,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(rename = "promptFeedback")]
    pub prompt_feedback: Option<PromptFeedback>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, if any.
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromptFeedback {
    #[serde(rename = "blockReason")]
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    pub prompt_token_count: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    pub candidates_token_count: u32,
    #[serde(rename = "totalTokenCount", default)]
    pub total_token_count: u32,
}

#[derive(Debug, Serialize)]
struct PredictLongRunningRequest {
    instances: Vec<VideoInstance>,
    parameters: VideoParameters,
}

#[derive(Debug, Serialize)]
struct VideoInstance {
    prompt: String,
    image: VideoImage,
}

#[derive(Debug, Serialize)]
struct VideoImage {
    #[serde(rename = "bytesBase64Encoded")]
    bytes_base64_encoded: String,
    #[serde(rename = "mimeType")]
    mime_type: String,
}

#[derive(Debug, Serialize)]
struct VideoParameters {
    #[serde(rename = "sampleCount")]
    sample_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct OperationResponse {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub response: Option<OperationResult>,
    pub error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
pub struct OperationResult {
    #[serde(rename = "generateVideoResponse")]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateVideoResponse {
    #[serde(rename = "generatedSamples", default)]
    pub generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedSample {
    pub video: Option<GeneratedVideo>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedVideo {
    pub uri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OperationError {
    pub code: Option<i32>,
    pub message: Option<String>,
}

impl From<OperationResponse> for VideoOperation {
    fn from(op: OperationResponse) -> Self {
        let video_uris = op
            .response
            .and_then(|r| r.generate_video_response)
            .map(|r| {
                r.generated_samples
                    .into_iter()
                    .filter_map(|sample| sample.video.and_then(|v| v.uri))
                    .collect()
            })
            .unwrap_or_default();
        let error = op.error.map(|e| match (e.code, e.message) {
            (Some(code), Some(message)) => format!("{} (code {})", message, code),
            (_, Some(message)) => message,
            (Some(code), None) => format!("operation failed with code {}", code),
            (None, None) => "operation failed".to_string(),
        });
        VideoOperation {
            name: op.name,
            done: op.done,
            video_uris,
            error,
        }
    }
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            video_model: config.video_model.clone(),
            temperature: config.temperature,
        }
    }

    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest<'_>,
    ) -> Result<GenerateContentResponse, ServiceError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.text_model);

        tracing::debug!(
            model = %self.text_model,
            parts = request.contents.iter().map(|c| c.parts.len()).sum::<usize>(),
            "Gemini generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;
        if !status.is_success() {
            tracing::error!("Gemini API error {}: {}", status, response_text);
            return Err(ServiceError::Api {
                status: status.as_u16(),
                body: response_text,
            });
        }

        tracing::debug!(
            "Gemini API response (truncated): {}...",
            response_text.chars().take(500).collect::<String>()
        );
        let parsed: GenerateContentResponse = serde_json::from_str(&response_text)?;
        if let Some(usage) = &parsed.usage_metadata {
            tracing::info!(
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                total_tokens = usage.total_token_count,
                "Gemini token usage"
            );
        }
        let block_reason = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_ref());
        if let Some(reason) = block_reason {
            tracing::warn!("Gemini blocked the prompt: {}", reason);
        }
        Ok(parsed)
    }

    async fn fetch_operation(&self, url: &str) -> Result<VideoOperation, ServiceError> {
        let response = self
            .client
            .get(url)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        Self::operation_from_response(response).await
    }

    async fn operation_from_response(
        response: reqwest::Response,
    ) -> Result<VideoOperation, ServiceError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ServiceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        let operation: OperationResponse = serde_json::from_str(&body)?;
        Ok(operation.into())
    }

    /// Appends the API key to an artifact locator.
    fn authorized_locator(&self, locator: &str) -> String {
        let separator = if locator.contains('?') { '&' } else { '?' };
        format!(
            "{}{}key={}",
            locator,
            separator,
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl StructuredGenerator for GeminiClient {
    async fn generate_structured(
        &self,
        parts: &[InstructionPart],
        schema: &Schema,
    ) -> Result<Option<String>, ServiceError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: parts.iter().map(Part::from).collect(),
                role: Some("user".to_string()),
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: "application/json",
                response_schema: schema,
            },
        };

        let response = self.generate_content(&request).await?;
        if let Some(reason) = response.candidates.first().and_then(|c| c.finish_reason.as_deref()) {
            tracing::debug!("Gemini finish reason: {}", reason);
        }
        Ok(response.text())
    }
}

#[async_trait]
impl VideoGenerator for GeminiClient {
    async fn submit_video_job(
        &self,
        prompt: &str,
        image: &ImageInput,
    ) -> Result<VideoOperation, ServiceError> {
        let url = format!("{}/models/{}:predictLongRunning", self.base_url, self.video_model);
        let request = PredictLongRunningRequest {
            instances: vec![VideoInstance {
                prompt: prompt.to_string(),
                image: VideoImage {
                    bytes_base64_encoded: BASE64_STANDARD.encode(&image.bytes),
                    mime_type: image.mime_type.clone(),
                },
            }],
            parameters: VideoParameters { sample_count: 1 },
        };

        tracing::info!(model = %self.video_model, "Submitting video generation job");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;
        Self::operation_from_response(response).await
    }

    async fn poll_video_job(
        &self,
        operation: &VideoOperation,
    ) -> Result<VideoOperation, ServiceError> {
        let url = format!("{}/{}", self.base_url, operation.name);
        self.fetch_operation(&url).await
    }

    async fn download_video(&self, locator: &str) -> Result<Vec<u8>, ServiceError> {
        tracing::info!("⬇️ Downloading generated video");
        let response = self.client.get(self.authorized_locator(locator)).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
