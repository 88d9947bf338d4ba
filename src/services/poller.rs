//! The polling state machine for long-running backend jobs.
//!
//! One cooperative loop per job id: immediate first status check, then a
//! fixed interval, bounded by a client-side watchdog measured from poll
//! start. Individual check failures are tolerated; only elapsed time,
//! token loss, or a terminal backend status stops the loop.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::models::job::{Job, JobStatus};
use crate::services::api::{ApiClient, ApiError};
use crate::services::auth::TokenStore;
use crate::services::router::ResultRouter;

/// Timing knobs for the poll loop.
#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(3000),
            timeout: Duration::from_millis(180_000),
        }
    }
}

/// Outcome of one non-terminal status check.
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// Backend still reports the job as pending. Unrecognized status
    /// strings land here too and keep the loop alive.
    Pending { raw_status: String },
    /// The check itself failed; the watchdog bounds how long this can
    /// go on.
    CheckFailed { detail: String },
}

/// Progress observer invoked on every non-terminal tick.
pub trait PollObserver: Send + Sync {
    fn on_tick(&self, job_id: &str, attempt: u32, outcome: &TickOutcome);
}

/// Default observer: debug-level progress logging.
pub struct TracingObserver;

impl PollObserver for TracingObserver {
    fn on_tick(&self, job_id: &str, attempt: u32, outcome: &TickOutcome) {
        match outcome {
            TickOutcome::Pending { raw_status } => {
                tracing::debug!(job_id, attempt, raw_status, "job still pending");
            }
            TickOutcome::CheckFailed { detail } => {
                tracing::warn!(job_id, attempt, detail, "status check failed, will retry");
            }
        }
    }
}

/// Tracks the single live poll loop allowed per job id.
#[derive(Default)]
pub struct JobRegistry {
    active: Mutex<HashMap<String, watch::Sender<bool>>>,
}

impl JobRegistry {
    /// Register a loop for `id`. `None` if one is already live.
    fn try_register(&self, id: &str) -> Option<watch::Receiver<bool>> {
        let mut active = self.active.lock().unwrap();
        if active.contains_key(id) {
            return None;
        }
        let (tx, rx) = watch::channel(false);
        active.insert(id.to_string(), tx);
        Some(rx)
    }

    fn release(&self, id: &str) {
        self.active.lock().unwrap().remove(id);
    }

    /// Cancel the loop for `id`, if any. The loop stops without routing
    /// a terminal result.
    pub fn cancel(&self, id: &str) -> bool {
        match self.active.lock().unwrap().remove(id) {
            Some(tx) => {
                let _ = tx.send(true);
                true
            }
            None => false,
        }
    }

    /// Cancel every live loop (UI teardown, page navigation).
    pub fn cancel_all(&self) {
        for (_, tx) in self.active.lock().unwrap().drain() {
            let _ = tx.send(true);
        }
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollerError {
    #[error("a poll loop is already active for job {0}")]
    AlreadyPolling(String),
}

/// Handle to a spawned poll loop.
pub struct PollHandle {
    job_id: String,
    registry: Arc<JobRegistry>,
    task: JoinHandle<Option<Job>>,
}

impl PollHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Stop the loop without invoking the result router.
    pub fn cancel(&self) {
        self.registry.cancel(&self.job_id);
    }

    /// Wait for the loop to finish. `None` if it was cancelled.
    pub async fn join(self) -> Option<Job> {
        self.task.await.ok().flatten()
    }
}

/// Terminal condition decided by the loop, applied to the job once.
enum Terminal {
    Completed(String),
    Failed(String),
    AuthLost,
    TimedOut,
}

/// Generic poller: one implementation for every job kind.
#[derive(Clone)]
pub struct Poller {
    api: Arc<ApiClient>,
    tokens: Arc<TokenStore>,
    router: Arc<ResultRouter>,
    registry: Arc<JobRegistry>,
    config: PollConfig,
    observer: Arc<dyn PollObserver>,
}

impl Poller {
    pub fn new(
        api: Arc<ApiClient>,
        tokens: Arc<TokenStore>,
        router: Arc<ResultRouter>,
        registry: Arc<JobRegistry>,
        config: PollConfig,
    ) -> Self {
        Self {
            api,
            tokens,
            router,
            registry,
            config,
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PollObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Route an already-terminal job immediately (submitter fast-path),
    /// otherwise start polling it.
    pub fn dispatch(&self, job: Job) -> Result<Option<PollHandle>, PollerError> {
        if job.status().is_terminal() {
            if let Err(e) = self.router.route(&job) {
                tracing::warn!(job_id = %job.id(), error = %e, "terminal job has no sink");
            }
            return Ok(None);
        }
        self.start(job).map(Some)
    }

    /// Spawn the poll loop for a pending job.
    ///
    /// Starting a second loop for the same id is a caller error.
    pub fn start(&self, job: Job) -> Result<PollHandle, PollerError> {
        let Some(cancel) = self.registry.try_register(job.id()) else {
            return Err(PollerError::AlreadyPolling(job.id().to_string()));
        };
        let job_id = job.id().to_string();
        let this = self.clone();
        let task = tokio::spawn(async move { this.run(job, cancel).await });
        Ok(PollHandle {
            job_id,
            registry: self.registry.clone(),
            task,
        })
    }

    async fn run(self, mut job: Job, mut cancel: watch::Receiver<bool>) -> Option<Job> {
        let started = Instant::now();
        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempt: u32 = 0;

        let terminal = loop {
            tokio::select! {
                biased;
                // Cancellation drops the job silently; the registry entry
                // was already removed by the canceller.
                _ = cancel.changed() => {
                    tracing::debug!(job_id = %job.id(), "poll cancelled");
                    return None;
                }
                _ = ticker.tick() => {}
            }

            if started.elapsed() >= self.config.timeout {
                break Terminal::TimedOut;
            }
            attempt += 1;

            // Token loss is not transient; stop without further retries.
            let Some(token) = self.tokens.get() else {
                break Terminal::AuthLost;
            };

            // The check itself races the cancel signal; a terminal
            // response landing after cancellation must not be applied.
            let checked = tokio::select! {
                biased;
                _ = cancel.changed() => {
                    tracing::debug!(job_id = %job.id(), "poll cancelled");
                    return None;
                }
                checked = self.api.job_status(job.id(), job.kind(), &token) => checked,
            };

            match checked {
                Ok(body) => match body.status.as_str() {
                    "COMPLETED" => break Terminal::Completed(body.result.unwrap_or_default()),
                    "FAILED" => {
                        break Terminal::Failed(
                            body.error.unwrap_or_else(|| "job failed".to_string()),
                        )
                    }
                    other => {
                        // Unrecognized statuses keep the loop alive.
                        self.observer.on_tick(
                            job.id(),
                            attempt,
                            &TickOutcome::Pending {
                                raw_status: other.to_string(),
                            },
                        );
                    }
                },
                Err(ApiError::Auth) => break Terminal::AuthLost,
                Err(e) => {
                    // A single failed check is not fatal; the watchdog
                    // bounds the total retry window.
                    self.observer.on_tick(
                        job.id(),
                        attempt,
                        &TickOutcome::CheckFailed {
                            detail: e.to_string(),
                        },
                    );
                }
            }
        };

        let transition = match terminal {
            Terminal::Completed(result) => job.complete(result),
            Terminal::Failed(error) => job.fail(error),
            Terminal::AuthLost => job.fail("authentication token missing or rejected"),
            Terminal::TimedOut => job.time_out(format!(
                "no terminal status within {} ms",
                self.config.timeout.as_millis()
            )),
        };
        if let Err(e) = transition {
            // Unreachable: the loop breaks exactly once per job.
            tracing::error!(job_id = %job.id(), error = %e, "duplicate terminal transition");
            return Some(job);
        }

        match job.status() {
            JobStatus::Completed => {
                metrics::counter!("websumm_jobs_completed_total").increment(1)
            }
            JobStatus::Failed => metrics::counter!("websumm_jobs_failed_total").increment(1),
            JobStatus::TimedOut => {
                metrics::counter!("websumm_jobs_timed_out_total").increment(1)
            }
            JobStatus::Pending => {}
        }
        metrics::histogram!("websumm_job_poll_seconds").record(started.elapsed().as_secs_f64());

        tracing::info!(
            job_id = %job.id(),
            kind = %job.kind(),
            status = %job.status(),
            attempts = attempt,
            "poll finished"
        );

        self.registry.release(job.id());
        if let Err(e) = self.router.route(&job) {
            tracing::warn!(job_id = %job.id(), error = %e, "terminal job has no sink");
        }
        Some(job)
    }
}
