// src/capability.rs
//! The generative capabilities the core consumes, kept behind traits so the
//! orchestration can run against the Gemini client or an in-memory fake.

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::schema::Schema;
use crate::types::ImageInput;

/// One ordered part of a multimodal instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionPart {
    Text(String),
    Image(ImageInput),
}

/// Schema-constrained text generation.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    /// Returns the structured text reply, or `None` when the service answered
    /// without any textual payload.
    async fn generate_structured(
        &self,
        parts: &[InstructionPart],
        schema: &Schema,
    ) -> Result<Option<String>, ServiceError>;
}

/// Snapshot of a long-running video generation job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoOperation {
    /// Opaque handle used to re-fetch the job.
    pub name: String,
    pub done: bool,
    /// Downloadable locators of the generated videos, in output order.
    pub video_uris: Vec<String>,
    /// Set when the job finished unsuccessfully.
    pub error: Option<String>,
}

/// Image-to-video generation plus artifact retrieval.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    async fn submit_video_job(
        &self,
        prompt: &str,
        image: &ImageInput,
    ) -> Result<VideoOperation, ServiceError>;

    /// Idempotent re-fetch of the job state.
    async fn poll_video_job(&self, operation: &VideoOperation)
        -> Result<VideoOperation, ServiceError>;

    /// Fetches a finished artifact, attaching whatever credential the
    /// locator requires.
    async fn download_video(&self, locator: &str) -> Result<Vec<u8>, ServiceError>;
}
