//! Request and response bodies for the summarizer backend wire contract.

use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};

/// 202 body from a job-creating endpoint.
///
/// The Rekognition endpoint names the field `jobId`, the Transcribe
/// endpoint `jobName`; both carry the opaque id used against the results
/// endpoint.
#[derive(Debug, Deserialize)]
pub struct AcceptedResponse {
    #[serde(rename = "jobId", alias = "jobName")]
    pub job_id: String,
}

/// Body of `GET /results/{jobId}?type=…`.
///
/// HTTP 202 is a valid carrier while `status` is `PENDING`.
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub result: Option<String>,
    pub error: Option<String>,
}

/// Non-202 success body from a job-creating endpoint: the backend
/// answered synchronously and no polling is needed.
#[derive(Debug, Deserialize)]
pub struct SyncResponse {
    pub detected_text: Option<String>,
    pub transcript: Option<String>,
}

/// Error payload shape used across backend endpoints. Some routes use
/// `error` with an optional `details` elaboration, the auth routes use
/// `message`.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn into_message(self) -> Option<String> {
        match (self.error.or(self.message), self.details) {
            (Some(message), Some(details)) => Some(format!("{message}: {details}")),
            (message, details) => message.or(details),
        }
    }
}

/// `POST /rekognition` request body.
#[derive(Debug, Serialize, Validate)]
pub struct DetectTextRequest {
    #[garde(length(min = 1, max = 2048))]
    pub image_url: String,
}

/// `POST /transcribe` request body; audio travels base64-encoded.
#[derive(Debug, Serialize, Validate)]
pub struct TranscribeRequest {
    #[garde(length(min = 1))]
    pub audio_data: String,
}

/// `POST /summarize` request body.
#[derive(Debug, Serialize)]
pub struct SummarizeRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

/// `POST /query` request body: a chat question grounded in the current
/// page text.
#[derive(Debug, Serialize)]
pub struct QueryRequest {
    pub question: String,
    pub context: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
}

/// One saved summary from `GET /history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub url: String,
    pub title: Option<String>,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryResponse {
    pub summaries: Vec<SummaryRecord>,
}
