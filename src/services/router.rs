//! Maps terminal jobs to UI sinks via a rebindable configuration table.
//!
//! The same job kind can render into different sink types depending on
//! which UI context is active (transcript into the chat log vs into the
//! query textbox), so the kind-to-sink mapping is data, not code.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::models::job::{Job, JobKind, JobStatus};
use crate::models::page::ChatEntry;

/// A dedicated text-output destination (detected-text box, query field).
pub trait TextSink: Send + Sync {
    fn set_text(&self, text: &str);
}

/// A conversation-log destination.
pub trait ChatSink: Send + Sync {
    fn push(&self, entry: ChatEntry);
}

/// Where a job kind currently renders.
#[derive(Clone)]
pub enum SinkBinding {
    Text(Arc<dyn TextSink>),
    Chat(Arc<dyn ChatSink>),
}

#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("no sink bound for job kind {0}")]
    Unrouted(JobKind),

    #[error("job {0} is not in a terminal state")]
    NotTerminal(String),
}

/// The routing table. Shared behind an `Arc`; bindings change as the UI
/// context changes.
#[derive(Default)]
pub struct ResultRouter {
    table: RwLock<HashMap<JobKind, SinkBinding>>,
}

impl ResultRouter {
    /// Bind (or rebind) where a job kind renders.
    pub fn bind(&self, kind: JobKind, binding: SinkBinding) {
        self.table.write().unwrap().insert(kind, binding);
    }

    pub fn unbind(&self, kind: JobKind) {
        self.table.write().unwrap().remove(&kind);
    }

    /// Render a terminal job into its bound sink.
    ///
    /// Failures and timeouts render a distinguishable message into the
    /// same sink the success path would have used.
    pub fn route(&self, job: &Job) -> Result<(), RouteError> {
        if !job.status().is_terminal() {
            return Err(RouteError::NotTerminal(job.id().to_string()));
        }
        let binding = self
            .table
            .read()
            .unwrap()
            .get(&job.kind())
            .cloned()
            .ok_or(RouteError::Unrouted(job.kind()))?;

        match binding {
            SinkBinding::Text(sink) => match job.status() {
                JobStatus::Completed => sink.set_text(job.result().unwrap_or_default()),
                _ => sink.set_text(&format!(
                    "Error: {}",
                    job.error().unwrap_or("unknown failure")
                )),
            },
            SinkBinding::Chat(sink) => match job.status() {
                JobStatus::Completed => {
                    sink.push(ChatEntry::assistant(job.result().unwrap_or_default()))
                }
                _ => sink.push(ChatEntry::system(format!(
                    "Error: {}",
                    job.error().unwrap_or("unknown failure")
                ))),
            },
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::models::page::ChatRole;

    #[derive(Default)]
    struct RecordingTextSink {
        writes: Mutex<Vec<String>>,
    }

    impl TextSink for RecordingTextSink {
        fn set_text(&self, text: &str) {
            self.writes.lock().unwrap().push(text.to_string());
        }
    }

    #[derive(Default)]
    struct RecordingChatSink {
        entries: Mutex<Vec<ChatEntry>>,
    }

    impl ChatSink for RecordingChatSink {
        fn push(&self, entry: ChatEntry) {
            self.entries.lock().unwrap().push(entry);
        }
    }

    fn router_with_sinks() -> (Arc<ResultRouter>, Arc<RecordingTextSink>, Arc<RecordingChatSink>) {
        let router = Arc::new(ResultRouter::default());
        let text = Arc::new(RecordingTextSink::default());
        let chat = Arc::new(RecordingChatSink::default());
        router.bind(JobKind::ImageTextDetection, SinkBinding::Text(text.clone()));
        router.bind(JobKind::AudioTranscription, SinkBinding::Chat(chat.clone()));
        (router, text, chat)
    }

    #[test]
    fn transcription_success_appends_one_chat_entry() {
        let (router, text, chat) = router_with_sinks();
        let job = Job::completed("t-1", JobKind::AudioTranscription, "hello");
        router.route(&job).unwrap();

        let entries = chat.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "hello");
        assert_eq!(entries[0].role, ChatRole::Assistant);
        assert!(text.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn detection_failure_writes_error_to_text_sink_only() {
        let (router, text, chat) = router_with_sinks();
        let mut job = Job::pending("d-1", JobKind::ImageTextDetection);
        job.fail("x").unwrap();
        router.route(&job).unwrap();

        assert_eq!(text.writes.lock().unwrap().as_slice(), ["Error: x"]);
        assert!(chat.entries.lock().unwrap().is_empty());
    }

    #[test]
    fn transcription_failure_is_system_tagged() {
        let (router, _, chat) = router_with_sinks();
        let mut job = Job::pending("t-2", JobKind::AudioTranscription);
        job.fail("speech unintelligible").unwrap();
        router.route(&job).unwrap();

        let entries = chat.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].role, ChatRole::System);
        assert_eq!(entries[0].text, "Error: speech unintelligible");
    }

    #[test]
    fn timeout_renders_into_the_success_sink() {
        let (router, text, _) = router_with_sinks();
        let mut job = Job::pending("d-2", JobKind::ImageTextDetection);
        job.time_out("no terminal status within 180000 ms").unwrap();
        router.route(&job).unwrap();

        let writes = text.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert!(writes[0].starts_with("Error: no terminal status"));
    }

    #[test]
    fn rebinding_changes_the_rendering_target() {
        let (router, text, chat) = router_with_sinks();
        // Transcript-into-textbox context: rebind transcription to text.
        router.bind(JobKind::AudioTranscription, SinkBinding::Text(text.clone()));

        let job = Job::completed("t-3", JobKind::AudioTranscription, "note to self");
        router.route(&job).unwrap();

        assert_eq!(text.writes.lock().unwrap().as_slice(), ["note to self"]);
        assert!(chat.entries.lock().unwrap().is_empty());
    }

    #[test]
    fn unbound_kind_is_an_error() {
        let router = ResultRouter::default();
        let job = Job::completed("d-3", JobKind::ImageTextDetection, "text");
        assert!(matches!(
            router.route(&job),
            Err(RouteError::Unrouted(JobKind::ImageTextDetection))
        ));
    }

    #[test]
    fn pending_job_is_rejected() {
        let (router, _, _) = router_with_sinks();
        let job = Job::pending("d-4", JobKind::ImageTextDetection);
        assert!(matches!(router.route(&job), Err(RouteError::NotTerminal(_))));
    }
}
