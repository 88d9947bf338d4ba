use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Serialize;

use crate::models::job::JobKind;
use crate::models::wire::{
    ErrorResponse, HistoryResponse, QueryRequest, QueryResponse, StatusResponse, SummarizeRequest,
    SummarizeResponse, SummaryRecord,
};

/// Failure modes of a backend call.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure; no response was received.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend rejected the request.
    #[error("backend rejected request ({status}): {message}")]
    Submission { status: u16, message: String },

    /// Bearer token absent, or rejected by the backend.
    #[error("authentication token missing or rejected")]
    Auth,

    /// A response arrived but could not be decoded.
    #[error("failed to decode backend response: {0}")]
    Decode(#[source] reqwest::Error),

    /// A well-formed response that violates the wire contract.
    #[error("unexpected backend response: {0}")]
    Protocol(String),
}

/// Thin authenticated wrapper over the summarizer backend.
///
/// Every call takes the bearer token explicitly; token lifecycle is owned
/// by the auth layer, not here.
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(request_timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST to a job-creating endpoint. Returns the raw response; the
    /// submitter decides between the 202 and synchronous paths.
    pub(crate) async fn post_job(
        &self,
        kind: JobKind,
        body: &impl Serialize,
        token: &str,
    ) -> Result<Response, ApiError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, kind.submit_path()))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        Ok(response)
    }

    /// One status check against the results endpoint.
    ///
    /// HTTP 202 still carries a `PENDING` body and is treated as success.
    pub async fn job_status(
        &self,
        job_id: &str,
        kind: JobKind,
        token: &str,
    ) -> Result<StatusResponse, ApiError> {
        let response = self
            .http
            .get(format!("{}/results/{}", self.base_url, job_id))
            .query(&[("type", kind.to_string())])
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Auth),
            status if status.is_success() => response.json().await.map_err(ApiError::Decode),
            _ => Err(self.read_error(response).await),
        }
    }

    /// Summarize page text. Synchronous on the backend; no job involved.
    pub async fn summarize(&self, content: &str, token: &str) -> Result<String, ApiError> {
        let body = SummarizeRequest {
            content: content.to_string(),
        };
        let response: SummarizeResponse = self.post_json("/summarize", &body, token).await?;
        Ok(response.summary)
    }

    /// Ask a chat question grounded in the current page text.
    pub async fn query(
        &self,
        question: &str,
        context: &str,
        token: &str,
    ) -> Result<String, ApiError> {
        let body = QueryRequest {
            question: question.to_string(),
            context: context.to_string(),
        };
        let response: QueryResponse = self.post_json("/query", &body, token).await?;
        Ok(response.answer)
    }

    /// Fetch the user's saved summaries.
    pub async fn history(&self, token: &str) -> Result<Vec<SummaryRecord>, ApiError> {
        let response = self
            .http
            .get(format!("{}/history", self.base_url))
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Auth),
            status if status.is_success() => {
                let body: HistoryResponse = response.json().await.map_err(ApiError::Decode)?;
                Ok(body.summaries)
            }
            _ => Err(self.read_error(response).await),
        }
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
        token: &str,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ApiError::Auth),
            status if status.is_success() => response.json().await.map_err(ApiError::Decode),
            _ => Err(self.read_error(response).await),
        }
    }

    /// Map a non-success response to a typed error, salvaging the backend
    /// message when the body parses.
    pub(crate) async fn read_error(&self, response: Response) -> ApiError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return ApiError::Auth;
        }
        let message = match response.json::<ErrorResponse>().await {
            Ok(body) => body
                .into_message()
                .unwrap_or_else(|| "no error detail".to_string()),
            Err(_) => "no error detail".to_string(),
        };
        ApiError::Submission {
            status: status.as_u16(),
            message,
        }
    }
}
