//! Login and session-token management against the backend's `/auth`
//! routes.
//!
//! The token store is the only state shared with the polling layer;
//! pollers read it, only this module writes it.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Shared bearer token for the current session.
#[derive(Default)]
pub struct TokenStore {
    token: RwLock<Option<String>>,
}

impl TokenStore {
    pub fn get(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.token.write().unwrap() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.token.write().unwrap() = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().unwrap().is_some()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("auth request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Serialize)]
struct CredentialsRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(rename = "clientId")]
    client_id: &'a str,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    email: &'a str,
    code: &'a str,
    #[serde(rename = "clientId")]
    client_id: &'a str,
}

#[derive(Serialize)]
struct ResendCodeRequest<'a> {
    email: &'a str,
    #[serde(rename = "clientId")]
    client_id: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct MessageResponse {
    message: Option<String>,
}

/// Client for the backend auth routes.
pub struct AuthClient {
    http: Client,
    base_url: String,
    client_id: String,
    tokens: Arc<TokenStore>,
}

impl AuthClient {
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        request_timeout: Duration,
        tokens: Arc<TokenStore>,
    ) -> Result<Self, AuthError> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            tokens,
        })
    }

    /// Log in and store the bearer token for the session.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let body = CredentialsRequest {
            email,
            password,
            client_id: &self.client_id,
        };
        let response = self
            .http
            .post(format!("{}/auth/login", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.rejected(response).await);
        }

        let login: LoginResponse = response.json().await?;
        self.tokens.set(login.token);
        tracing::info!(email, "login succeeded");
        Ok(())
    }

    /// Register a new account; the backend emails a verification code.
    pub async fn register(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let body = CredentialsRequest {
            email,
            password,
            client_id: &self.client_id,
        };
        self.message_request("/auth/register", &body).await
    }

    /// Confirm the emailed verification code.
    pub async fn verify(&self, email: &str, code: &str) -> Result<String, AuthError> {
        let body = VerifyRequest {
            email,
            code,
            client_id: &self.client_id,
        };
        self.message_request("/auth/verify", &body).await
    }

    /// Ask the backend to resend the verification code.
    pub async fn resend_code(&self, email: &str) -> Result<String, AuthError> {
        let body = ResendCodeRequest {
            email,
            client_id: &self.client_id,
        };
        self.message_request("/auth/resend-code", &body).await
    }

    /// Drop the stored token.
    pub fn logout(&self) {
        self.tokens.clear();
        tracing::info!("logged out");
    }

    async fn message_request(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<String, AuthError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(self.rejected(response).await);
        }

        let message: MessageResponse = response.json().await?;
        Ok(message.message.unwrap_or_else(|| "ok".to_string()))
    }

    async fn rejected(&self, response: reqwest::Response) -> AuthError {
        let status = response.status().as_u16();
        let message = match response.json::<MessageResponse>().await {
            Ok(body) => body.message.unwrap_or_else(|| "no detail".to_string()),
            Err(_) => "no detail".to_string(),
        };
        AuthError::Rejected { status, message }
    }
}
