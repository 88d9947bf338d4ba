use std::sync::Arc;

use base64::Engine;
use garde::Validate;
use reqwest::StatusCode;
use uuid::Uuid;

use crate::models::job::{Job, JobKind};
use crate::models::wire::{AcceptedResponse, DetectTextRequest, SyncResponse, TranscribeRequest};
use crate::services::api::{ApiClient, ApiError};
use crate::services::auth::TokenStore;

/// Kind-specific job input. The payload determines the job kind.
#[derive(Debug, Clone)]
pub enum SubmitPayload {
    /// URL of the image to run text detection on.
    ImageUrl(String),
    /// Base64-encoded audio to transcribe.
    AudioData(String),
}

impl SubmitPayload {
    /// Encode raw audio bytes for a transcription job.
    pub fn audio_from_bytes(bytes: &[u8]) -> Self {
        SubmitPayload::AudioData(base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    pub fn kind(&self) -> JobKind {
        match self {
            SubmitPayload::ImageUrl(_) => JobKind::ImageTextDetection,
            SubmitPayload::AudioData(_) => JobKind::AudioTranscription,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("invalid payload: {0}")]
    Invalid(#[from] garde::Report),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Creates backend jobs. On error, no `Job` exists and nothing polls.
pub struct Submitter {
    api: Arc<ApiClient>,
    tokens: Arc<TokenStore>,
}

impl Submitter {
    pub fn new(api: Arc<ApiClient>, tokens: Arc<TokenStore>) -> Self {
        Self { api, tokens }
    }

    /// Submit a job-creating request.
    ///
    /// A 202 with a job id yields a `Pending` job for the poller; any
    /// other 2xx is the backend's synchronous fast-path and yields a
    /// `Completed` job directly.
    pub async fn submit(&self, payload: SubmitPayload) -> Result<Job, SubmitError> {
        let kind = payload.kind();
        let token = self.tokens.get().ok_or(ApiError::Auth)?;

        let response = match &payload {
            SubmitPayload::ImageUrl(url) => {
                let body = DetectTextRequest {
                    image_url: url.clone(),
                };
                body.validate()?;
                self.api.post_job(kind, &body, &token).await?
            }
            SubmitPayload::AudioData(data) => {
                let body = TranscribeRequest {
                    audio_data: data.clone(),
                };
                body.validate()?;
                self.api.post_job(kind, &body, &token).await?
            }
        };

        let status = response.status();
        let job = match status {
            StatusCode::ACCEPTED => {
                let accepted: AcceptedResponse =
                    response.json().await.map_err(ApiError::Decode)?;
                tracing::info!(job_id = %accepted.job_id, %kind, "job accepted");
                Job::pending(accepted.job_id, kind)
            }
            status if status.is_success() => {
                let sync: SyncResponse = response.json().await.map_err(ApiError::Decode)?;
                let text = match kind {
                    JobKind::ImageTextDetection => sync.detected_text,
                    JobKind::AudioTranscription => sync.transcript,
                }
                .ok_or_else(|| {
                    ApiError::Protocol(format!(
                        "{} response is missing both a job id and a result",
                        status
                    ))
                })?;
                tracing::info!(%kind, "job answered synchronously");
                Job::completed(format!("sync-{}", Uuid::new_v4()), kind, text)
            }
            _ => return Err(self.api.read_error(response).await.into()),
        };

        metrics::counter!("websumm_jobs_submitted_total").increment(1);
        Ok(job)
    }
}
