// src/jobs/video_job.rs
//! Image-to-video job runner: submit, poll with narration, download, store.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::capability::{VideoGenerator, VideoOperation};
use crate::config::VideoJobConfig;
use crate::error::VideoError;
use crate::types::ImageInput;

/// Rotating status lines shown while the job is in flight. They describe
/// what typically happens, not measured progress.
pub const NARRATION_MESSAGES: [&str; 6] = [
    "Warming up the studio lights...",
    "Studying the details of your craft...",
    "Composing the opening shot...",
    "Animating textures and light...",
    "Adding the finishing touches...",
    "Almost there, polishing the final cut...",
];

/// Human-readable progress events emitted by [`VideoJobRunner::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum VideoNarration {
    Preparing { message: String },
    Waiting { attempt: u32, message: String },
    Downloading { message: String },
    Complete { message: String },
}

impl VideoNarration {
    pub fn message(&self) -> &str {
        match self {
            VideoNarration::Preparing { message }
            | VideoNarration::Waiting { message, .. }
            | VideoNarration::Downloading { message }
            | VideoNarration::Complete { message } => message,
        }
    }
}

/// A downloaded video addressable on the local machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoResource {
    pub id: Uuid,
    pub file_name: String,
    pub path: PathBuf,
    pub mime_type: String,
    pub size_bytes: usize,
}

impl VideoResource {
    /// Path under which the HTTP layer serves the output directory.
    pub fn url(&self) -> String {
        format!("/outputs/{}", self.file_name)
    }
}

pub struct VideoJobRunner {
    generator: Arc<dyn VideoGenerator>,
    config: VideoJobConfig,
}

impl VideoJobRunner {
    pub fn new(generator: Arc<dyn VideoGenerator>, config: VideoJobConfig) -> Self {
        Self { generator, config }
    }

    /// Drives one job to completion.
    ///
    /// Narration is best effort: a dropped receiver does not stop the job.
    /// Cancelling `cancel` aborts the current wait or request and returns
    /// [`VideoError::Cancelled`].
    pub async fn run(
        &self,
        prompt: &str,
        image: &ImageInput,
        narration: mpsc::UnboundedSender<VideoNarration>,
        cancel: CancellationToken,
    ) -> Result<VideoResource, VideoError> {
        let narrate = |event: VideoNarration| {
            let _ = narration.send(event);
        };

        narrate(VideoNarration::Preparing {
            message: "Preparing your video request...".to_string(),
        });

        let submission = self.generator.submit_video_job(prompt, image);
        let mut operation = cancellable(&cancel, submission).await??;
        tracing::info!(operation = %operation.name, "🎬 Video job submitted");

        let mut polls: u32 = 0;
        while !operation.done {
            if polls >= self.config.max_polls {
                tracing::warn!(operation = %operation.name, polls, "Video job timed out");
                return Err(VideoError::Timeout { attempts: polls });
            }

            narrate(VideoNarration::Waiting {
                attempt: polls + 1,
                message: NARRATION_MESSAGES[polls as usize % NARRATION_MESSAGES.len()].to_string(),
            });
            cancellable(&cancel, tokio::time::sleep(self.config.poll_interval)).await?;

            operation = cancellable(&cancel, self.generator.poll_video_job(&operation)).await??;
            polls += 1;
            tracing::debug!(
                operation = %operation.name,
                polls,
                done = operation.done,
                "Video job polled"
            );
        }

        let locator = finished_locator(&operation)?;

        narrate(VideoNarration::Downloading {
            message: "Downloading your video...".to_string(),
        });
        let bytes = cancellable(&cancel, self.generator.download_video(locator))
            .await?
            .map_err(|e| VideoError::DownloadFailed(e.to_string()))?;
        if bytes.is_empty() {
            return Err(VideoError::DownloadFailed("empty response body".to_string()));
        }

        let resource = self.store(bytes).await?;
        tracing::info!(
            file = %resource.path.display(),
            size_bytes = resource.size_bytes,
            "✅ Video stored"
        );

        narrate(VideoNarration::Complete {
            message: "Your video is ready!".to_string(),
        });
        Ok(resource)
    }

    async fn store(&self, bytes: Vec<u8>) -> Result<VideoResource, VideoError> {
        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let id = Uuid::new_v4();
        let file_name = format!("{}.mp4", id);
        let path = self.config.output_dir.join(&file_name);
        tokio::fs::write(&path, &bytes).await?;

        Ok(VideoResource {
            id,
            file_name,
            path,
            mime_type: "video/mp4".to_string(),
            size_bytes: bytes.len(),
        })
    }
}

fn finished_locator(operation: &VideoOperation) -> Result<&str, VideoError> {
    if let Some(error) = &operation.error {
        return Err(VideoError::JobFailed(error.clone()));
    }
    operation
        .video_uris
        .first()
        .map(String::as_str)
        .ok_or(VideoError::MissingArtifact)
}

async fn cancellable<F: std::future::Future>(
    cancel: &CancellationToken,
    future: F,
) -> Result<F::Output, VideoError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(VideoError::Cancelled),
        output = future => Ok(output),
    }
}
