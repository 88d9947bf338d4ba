//! Shared fixtures for the wiremock-backed integration tests.
//!
//! Each integration test crate uses a different subset of these helpers.
#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use websumm::models::page::ChatEntry;
use websumm::services::api::ApiClient;
use websumm::services::auth::TokenStore;
use websumm::services::poller::{
    JobRegistry, PollConfig, PollObserver, Poller, TickOutcome,
};
use websumm::services::router::{ChatSink, ResultRouter, TextSink};
use websumm::services::submit::Submitter;

/// Timing tuned so a full watchdog expiry stays well under a second.
pub fn fast_poll_config() -> PollConfig {
    PollConfig {
        interval: Duration::from_millis(20),
        timeout: Duration::from_millis(100),
    }
}

pub struct TestStack {
    pub api: Arc<ApiClient>,
    pub tokens: Arc<TokenStore>,
    pub router: Arc<ResultRouter>,
    pub registry: Arc<JobRegistry>,
    pub submitter: Submitter,
    pub poller: Poller,
}

/// Build the full client stack against a mock backend, pre-authenticated.
pub fn stack(base_url: &str, config: PollConfig) -> TestStack {
    let api = Arc::new(
        ApiClient::new(base_url.to_string(), Duration::from_secs(5)).expect("client build"),
    );
    let tokens = Arc::new(TokenStore::default());
    tokens.set("test-token");
    let router = Arc::new(ResultRouter::default());
    let registry = Arc::new(JobRegistry::default());
    let submitter = Submitter::new(api.clone(), tokens.clone());
    let poller = Poller::new(
        api.clone(),
        tokens.clone(),
        router.clone(),
        registry.clone(),
        config,
    );
    TestStack {
        api,
        tokens,
        router,
        registry,
        submitter,
        poller,
    }
}

#[derive(Default)]
pub struct RecordingTextSink {
    pub writes: Mutex<Vec<String>>,
}

impl RecordingTextSink {
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }
}

impl TextSink for RecordingTextSink {
    fn set_text(&self, text: &str) {
        self.writes.lock().unwrap().push(text.to_string());
    }
}

#[derive(Default)]
pub struct RecordingChatSink {
    pub entries: Mutex<Vec<ChatEntry>>,
}

impl RecordingChatSink {
    pub fn entries(&self) -> Vec<ChatEntry> {
        self.entries.lock().unwrap().clone()
    }
}

impl ChatSink for RecordingChatSink {
    fn push(&self, entry: ChatEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}

/// Counts non-terminal ticks by outcome.
#[derive(Default)]
pub struct CountingObserver {
    pub pending: AtomicU32,
    pub check_failed: AtomicU32,
}

impl CountingObserver {
    pub fn pending_ticks(&self) -> u32 {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn failed_ticks(&self) -> u32 {
        self.check_failed.load(Ordering::SeqCst)
    }
}

impl PollObserver for CountingObserver {
    fn on_tick(&self, _job_id: &str, _attempt: u32, outcome: &TickOutcome) {
        match outcome {
            TickOutcome::Pending { .. } => self.pending.fetch_add(1, Ordering::SeqCst),
            TickOutcome::CheckFailed { .. } => self.check_failed.fetch_add(1, Ordering::SeqCst),
        };
    }
}
