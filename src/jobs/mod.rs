// src/jobs/mod.rs
//! Background video jobs.
//! The registry tracks each job's latest narration and outcome so the HTTP
//! layer can report status and cancel jobs the caller abandoned.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use serde::Serialize;
use chrono::{DateTime, Utc};

use crate::error::VideoError;

pub mod video_job;

pub use video_job::{VideoJobRunner, VideoNarration, VideoResource, NARRATION_MESSAGES};

/// Unique identifier for a background job
pub type JobId = String;

/// Job status representing the current state
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not yet acknowledged by the video service
    Submitted { message: String },
    /// Waiting for the video service to finish
    Polling { attempt: u32, message: String },
    /// Finished; the video is served from `url`
    Completed { url: String, size_bytes: usize },
    Failed { error: String },
    Cancelled,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed { .. } | JobStatus::Failed { .. } | JobStatus::Cancelled
        )
    }
}

/// Job metadata
#[derive(Debug, Clone, Serialize)]
pub struct VideoJobRecord {
    pub id: JobId,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub status: JobStatus,
    /// Stored video, deleted together with the record.
    #[serde(skip)]
    pub output_path: Option<PathBuf>,
}

/// In-memory registry of video jobs
pub struct JobManager {
    jobs: RwLock<HashMap<JobId, VideoJobRecord>>,
    cancel_tokens: RwLock<HashMap<JobId, CancellationToken>>,
}

impl JobManager {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            cancel_tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Create and store a new job
    pub async fn create_job(&self) -> (JobId, CancellationToken) {
        let job_id = Uuid::new_v4().to_string();
        let token = CancellationToken::new();
        let record = VideoJobRecord {
            id: job_id.clone(),
            created_at: Utc::now(),
            completed_at: None,
            status: JobStatus::Submitted {
                message: "Queued".to_string(),
            },
            output_path: None,
        };
        self.jobs.write().await.insert(job_id.clone(), record);
        self.cancel_tokens
            .write()
            .await
            .insert(job_id.clone(), token.clone());
        tracing::info!("🎬 Created video job: {}", job_id);
        (job_id, token)
    }

    /// Starts a video job in the background and returns its id immediately.
    /// `start` receives the narration sender and the job's cancellation token.
    pub async fn spawn_video_job<F, Fut>(self: &Arc<Self>, start: F) -> JobId
    where
        F: FnOnce(mpsc::UnboundedSender<VideoNarration>, CancellationToken) -> Fut,
        Fut: Future<Output = Result<VideoResource, VideoError>> + Send + 'static,
    {
        let (job_id, cancel) = self.create_job().await;
        let (tx, mut rx) = mpsc::unbounded_channel::<VideoNarration>();

        let manager = Arc::clone(self);
        let narration_job = job_id.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                manager.apply_narration(&narration_job, &event).await;
            }
        });

        let manager = Arc::clone(self);
        let run_job = job_id.clone();
        let job = start(tx, cancel);
        tokio::spawn(async move {
            let result = job.await;
            manager.finish_job(&run_job, result.as_ref()).await;
        });

        job_id
    }

    /// Folds a narration event into the job status.
    pub async fn apply_narration(&self, job_id: &str, event: &VideoNarration) {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(job_id) else {
            return;
        };
        if job.status.is_finished() {
            return;
        }
        job.status = match event {
            VideoNarration::Preparing { message } => JobStatus::Submitted {
                message: message.clone(),
            },
            VideoNarration::Waiting { attempt, message } => JobStatus::Polling {
                attempt: *attempt,
                message: message.clone(),
            },
            VideoNarration::Downloading { message } | VideoNarration::Complete { message } => {
                let attempt = match &job.status {
                    JobStatus::Polling { attempt, .. } => *attempt,
                    _ => 0,
                };
                JobStatus::Polling {
                    attempt,
                    message: message.clone(),
                }
            }
        };
        tracing::debug!("📊 Job {} narration: {}", job_id, event.message());
    }

    /// Records the outcome of a job and drops its cancellation handle.
    pub async fn finish_job(&self, job_id: &str, result: Result<&VideoResource, &VideoError>) {
        let status = match result {
            Ok(resource) => JobStatus::Completed {
                url: resource.url(),
                size_bytes: resource.size_bytes,
            },
            Err(VideoError::Cancelled) => JobStatus::Cancelled,
            Err(e) => {
                tracing::error!("❌ Video job {} failed: {}", job_id, e);
                JobStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        if let Some(job) = self.jobs.write().await.get_mut(job_id) {
            job.status = status;
            job.completed_at = Some(Utc::now());
            job.output_path = result.ok().map(|resource| resource.path.clone());
        }
        self.cancel_tokens.write().await.remove(job_id);
    }

    /// Get job status
    pub async fn get_job_status(&self, job_id: &str) -> Option<JobStatus> {
        let jobs = self.jobs.read().await;
        jobs.get(job_id).map(|job| job.status.clone())
    }

    /// Get job details
    pub async fn get_job(&self, job_id: &str) -> Option<VideoJobRecord> {
        let jobs = self.jobs.read().await;
        jobs.get(job_id).cloned()
    }

    /// Cancels a job that is still running.
    pub async fn cancel_job(&self, job_id: &str) -> Result<(), String> {
        let tokens = self.cancel_tokens.read().await;
        match tokens.get(job_id) {
            Some(token) => {
                token.cancel();
                tracing::info!("🛑 Cancellation requested for job {}", job_id);
                Ok(())
            }
            None => Err(format!("No running job {}", job_id)),
        }
    }

    /// Drops finished jobs older than `max_age_hours` along with their videos.
    pub async fn cleanup_old_jobs(&self, max_age_hours: i64) {
        let cutoff = Utc::now() - chrono::Duration::hours(max_age_hours);
        let mut expired = Vec::new();
        {
            let mut jobs = self.jobs.write().await;
            jobs.retain(|_, job| {
                let keep = job.completed_at.map_or(true, |done| done >= cutoff);
                if !keep {
                    expired.push(job.output_path.take());
                }
                keep
            });
        }

        if expired.is_empty() {
            return;
        }
        for path in expired.iter().flatten() {
            if let Err(e) = tokio::fs::remove_file(path).await {
                tracing::warn!("Failed to remove expired video {}: {}", path.display(), e);
            }
        }
        tracing::debug!("🗑️ Cleaned up {} old jobs", expired.len());
    }
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Global job manager instance (to be stored in AppState)
pub type SharedJobManager = Arc<JobManager>;
