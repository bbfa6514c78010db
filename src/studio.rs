// src/studio.rs
//! Entry points used by the HTTP layer: marketing copy generation, video
//! generation, and a combined campaign run where the two flows proceed side
//! by side and fail independently.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::capability::StructuredGenerator;
use crate::error::{GenerationError, RequestError, VideoError};
use crate::generation::request_bundle;
use crate::jobs::{JobId, SharedJobManager, VideoJobRunner, VideoNarration, VideoResource};
use crate::prompt::{build_content_prompt, build_video_prompt};
use crate::schema::ResponseShape;
use crate::types::{ContentKind, ContentSelection, GenerationBundle, ImageInput, LanguageCode};

/// Everything the user selected for one generation.
#[derive(Debug, Clone)]
pub struct CampaignRequest {
    pub description: String,
    pub image: Option<ImageInput>,
    pub content_kinds: Vec<ContentKind>,
    pub languages: Vec<LanguageCode>,
}

impl CampaignRequest {
    pub fn validate(&self) -> Result<ContentSelection, RequestError> {
        if self.description.trim().is_empty() {
            return Err(RequestError::MissingDescription);
        }
        let selection = ContentSelection::new(&self.content_kinds);
        if selection.is_empty() {
            return Err(RequestError::NoContentKinds);
        }
        if selection.wants_video() && self.image.is_none() {
            return Err(RequestError::VideoRequiresImage);
        }
        Ok(selection)
    }
}

/// Outcome of one campaign. The text result never depends on the video job.
#[derive(Debug)]
pub struct CampaignOutcome {
    pub content: Result<GenerationBundle, GenerationError>,
    /// Background video job; `None` when no video was requested.
    pub video_job: Option<JobId>,
}

/// Cheap to clone: both capabilities sit behind `Arc`s.
#[derive(Clone)]
pub struct Studio {
    generator: Arc<dyn StructuredGenerator>,
    video_runner: Arc<VideoJobRunner>,
}

impl Studio {
    pub fn new(generator: Arc<dyn StructuredGenerator>, video_runner: Arc<VideoJobRunner>) -> Self {
        Self {
            generator,
            video_runner,
        }
    }

    /// Analysis for every language plus the requested non-video kinds.
    /// A video kind in `content_kinds` only adds the English video suggestions.
    pub async fn generate_marketing_content(
        &self,
        description: &str,
        image: Option<&ImageInput>,
        content_kinds: &[ContentKind],
        languages: &[LanguageCode],
    ) -> Result<GenerationBundle, GenerationError> {
        let shape = ResponseShape::new(&ContentSelection::new(content_kinds), languages);
        let instruction = build_content_prompt(description, &shape, image.is_some());

        tracing::info!(
            languages = ?shape.languages(),
            content_kinds = ?shape.content_kinds(),
            video_suggestions = shape.wants_video_suggestions(),
            has_image = image.is_some(),
            "Generating marketing content"
        );

        let result = request_bundle(self.generator.as_ref(), &instruction, &shape, image).await;
        match &result {
            Ok(bundle) => tracing::info!(
                languages = bundle.languages().count(),
                "✅ Marketing content generated"
            ),
            Err(e) => tracing::error!("Error generating content: {}", e),
        }
        result
    }

    pub async fn generate_video(
        &self,
        prompt: &str,
        image: &ImageInput,
        narration: mpsc::UnboundedSender<VideoNarration>,
        cancel: CancellationToken,
    ) -> Result<VideoResource, VideoError> {
        self.video_runner.run(prompt, image, narration, cancel).await
    }

    /// Validates the request, starts the video job in the background when
    /// one was asked for, then runs the text flow. The job keeps running
    /// whatever the text flow returns.
    pub async fn run_campaign(
        &self,
        request: &CampaignRequest,
        jobs: &SharedJobManager,
    ) -> Result<CampaignOutcome, RequestError> {
        let selection = request.validate()?;

        let video_job = match (selection.wants_video(), request.image.clone()) {
            (true, Some(image)) => {
                let studio = self.clone();
                let prompt = build_video_prompt(&request.description);
                let id = jobs
                    .spawn_video_job(move |narration, cancel| async move {
                        studio.generate_video(&prompt, &image, narration, cancel).await
                    })
                    .await;
                Some(id)
            }
            _ => None,
        };

        let content = self
            .generate_marketing_content(
                &request.description,
                request.image.as_ref(),
                &request.content_kinds,
                &request.languages,
            )
            .await;

        Ok(CampaignOutcome { content, video_job })
    }
}
