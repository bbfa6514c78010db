// src/error.rs
//! Error taxonomy shared by the text generation flow and the video job flow.

use thiserror::Error;

/// Failure of a call to the remote generation capability itself
/// (network, auth, quota, undecodable envelope).
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gemini API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("error decoding response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Errors surfaced by the marketing copy generation flow.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Received an empty response from the API")]
    EmptyResponse,
    #[error("The API response did not match the expected shape: {0}")]
    MalformedResponse(String),
    #[error("Failed to generate marketing content: {0}")]
    Service(#[from] ServiceError),
}

/// Errors surfaced by the video job flow.
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Video generation completed, but no download link was found")]
    MissingArtifact,
    #[error("Failed to download the generated video: {0}")]
    DownloadFailed(String),
    #[error("Video generation failed: {0}")]
    Service(#[from] ServiceError),
    #[error("Video generation job failed: {0}")]
    JobFailed(String),
    #[error("Video generation did not complete after {attempts} status checks")]
    Timeout { attempts: u32 },
    #[error("Video generation was cancelled")]
    Cancelled,
    #[error("Failed to store the generated video: {0}")]
    Storage(#[from] std::io::Error),
}

/// Input that can never produce a useful generation request.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RequestError {
    #[error("Please provide a description and select at least one content type.")]
    MissingDescription,
    #[error("Please provide a description and select at least one content type.")]
    NoContentKinds,
    #[error("An image is required to generate a video.")]
    VideoRequiresImage,
    #[error("Unknown content type: {0}")]
    UnknownContentKind(String),
    #[error("Unsupported language: {0}")]
    UnknownLanguage(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}
