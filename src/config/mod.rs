use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the summarizer API.
    pub api_base_url: String,

    /// Base URL for auth endpoints. Defaults to the API base.
    pub auth_base_url: Option<String>,

    /// App client id sent with every auth request.
    pub client_id: String,

    /// Fixed delay between status checks, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Client-side watchdog for an entire poll, in milliseconds.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// Per-request HTTP timeout, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_poll_timeout_ms() -> u64 {
    180_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn auth_base(&self) -> &str {
        self.auth_base_url.as_deref().unwrap_or(&self.api_base_url)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
