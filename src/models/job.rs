use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of asynchronous backend job.
///
/// The strum serialization doubles as the `type` query value on the
/// results endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum JobKind {
    /// Detect text in an image via the backend's Rekognition pipeline.
    #[strum(serialize = "rekognition")]
    ImageTextDetection,
    /// Transcribe a recorded voice query.
    #[strum(serialize = "transcribe")]
    AudioTranscription,
}

impl JobKind {
    /// Path of the job-creating POST endpoint for this kind.
    pub fn submit_path(self) -> &'static str {
        match self {
            JobKind::ImageTextDetection => "/rekognition",
            JobKind::AudioTranscription => "/transcribe",
        }
    }
}

/// Status of a backend job as tracked by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Completed,
    Failed,
    TimedOut,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// Attempted transition out of a terminal state.
#[derive(Debug, thiserror::Error)]
#[error("job is already in terminal state {0}")]
pub struct TransitionError(pub JobStatus);

/// A backend-tracked unit of asynchronous work.
///
/// Status moves monotonically from `Pending` to exactly one of
/// `Completed`, `Failed` or `TimedOut`; the transition methods reject any
/// second terminal transition. `result` is set only on completion,
/// `error` only on failure or timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    id: String,
    kind: JobKind,
    submitted_at: DateTime<Utc>,
    status: JobStatus,
    result: Option<String>,
    error: Option<String>,
}

impl Job {
    /// New pending job, as created from a 202 accepted response.
    pub fn pending(id: impl Into<String>, kind: JobKind) -> Self {
        Self {
            id: id.into(),
            kind,
            submitted_at: Utc::now(),
            status: JobStatus::Pending,
            result: None,
            error: None,
        }
    }

    /// Already-completed job, for the backend's synchronous fast-path.
    pub fn completed(id: impl Into<String>, kind: JobKind, result: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            submitted_at: Utc::now(),
            status: JobStatus::Completed,
            result: Some(result.into()),
            error: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn complete(&mut self, result: impl Into<String>) -> Result<(), TransitionError> {
        self.terminal_guard()?;
        self.status = JobStatus::Completed;
        self.result = Some(result.into());
        Ok(())
    }

    pub fn fail(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.terminal_guard()?;
        self.status = JobStatus::Failed;
        self.error = Some(error.into());
        Ok(())
    }

    pub fn time_out(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.terminal_guard()?;
        self.status = JobStatus::TimedOut;
        self.error = Some(error.into());
        Ok(())
    }

    fn terminal_guard(&self) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            Err(TransitionError(self.status))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_job_has_no_payloads() {
        let job = Job::pending("j-1", JobKind::ImageTextDetection);
        assert_eq!(job.status(), JobStatus::Pending);
        assert!(job.result().is_none());
        assert!(job.error().is_none());
    }

    #[test]
    fn complete_sets_result_only() {
        let mut job = Job::pending("j-1", JobKind::ImageTextDetection);
        job.complete("STOP").unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.result(), Some("STOP"));
        assert!(job.error().is_none());
    }

    #[test]
    fn fail_sets_error_only() {
        let mut job = Job::pending("j-1", JobKind::AudioTranscription);
        job.fail("backend exploded").unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.result().is_none());
        assert_eq!(job.error(), Some("backend exploded"));
    }

    #[test]
    fn terminal_states_are_absorbing() {
        let mut job = Job::pending("j-1", JobKind::ImageTextDetection);
        job.complete("text").unwrap();
        assert!(job.fail("late failure").is_err());
        assert!(job.time_out("late timeout").is_err());
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.result(), Some("text"));
        assert!(job.error().is_none());
    }

    #[test]
    fn timed_out_is_terminal() {
        let mut job = Job::pending("j-1", JobKind::AudioTranscription);
        job.time_out("watchdog").unwrap();
        assert!(job.status().is_terminal());
        assert!(job.complete("late result").is_err());
        assert_eq!(job.status(), JobStatus::TimedOut);
    }

    #[test]
    fn kind_maps_to_endpoints() {
        assert_eq!(JobKind::ImageTextDetection.submit_path(), "/rekognition");
        assert_eq!(JobKind::AudioTranscription.submit_path(), "/transcribe");
        assert_eq!(JobKind::ImageTextDetection.to_string(), "rekognition");
        assert_eq!(JobKind::AudioTranscription.to_string(), "transcribe");
    }
}
