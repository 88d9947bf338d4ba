//! Auth flow against the backend `/auth` routes: login, registration,
//! verification and the shared token store.

use std::sync::Arc;
use std::time::Duration;

use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

use websumm::services::auth::{AuthClient, AuthError, TokenStore};

fn client(base_url: &str, tokens: Arc<TokenStore>) -> AuthClient {
    AuthClient::new(base_url, "test-client", Duration::from_secs(5), tokens).unwrap()
}

#[tokio::test]
async fn login_stores_the_token_and_sends_the_client_id() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/auth/login"))
        .and(matchers::body_json(serde_json::json!({
            "email": "user@example.com",
            "password": "hunter2",
            "clientId": "test-client"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "bearer-xyz"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tokens = Arc::new(TokenStore::default());
    let auth = client(&server.uri(), tokens.clone());
    auth.login("user@example.com", "hunter2").await.unwrap();

    assert_eq!(tokens.get().as_deref(), Some("bearer-xyz"));
}

#[tokio::test]
async fn rejected_login_leaves_the_store_empty() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "message": "Incorrect username or password"
        })))
        .mount(&server)
        .await;

    let tokens = Arc::new(TokenStore::default());
    let auth = client(&server.uri(), tokens.clone());
    let err = auth.login("user@example.com", "wrong").await.unwrap_err();

    match err {
        AuthError::Rejected { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect username or password");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(!tokens.is_authenticated());
}

#[tokio::test]
async fn register_returns_the_backend_message() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/auth/register"))
        .and(matchers::body_json(serde_json::json!({
            "email": "new@example.com",
            "password": "hunter2",
            "clientId": "test-client"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Verification code sent"
        })))
        .mount(&server)
        .await;

    let tokens = Arc::new(TokenStore::default());
    let auth = client(&server.uri(), tokens);
    let message = auth.register("new@example.com", "hunter2").await.unwrap();
    assert_eq!(message, "Verification code sent");
}

#[tokio::test]
async fn verify_confirms_the_emailed_code() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/auth/verify"))
        .and(matchers::body_json(serde_json::json!({
            "email": "new@example.com",
            "code": "123456",
            "clientId": "test-client"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "Email verified"
        })))
        .mount(&server)
        .await;

    let tokens = Arc::new(TokenStore::default());
    let auth = client(&server.uri(), tokens);
    let message = auth.verify("new@example.com", "123456").await.unwrap();
    assert_eq!(message, "Email verified");
}

#[tokio::test]
async fn resend_code_without_a_body_message_falls_back() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/auth/resend-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let tokens = Arc::new(TokenStore::default());
    let auth = client(&server.uri(), tokens);
    let message = auth.resend_code("new@example.com").await.unwrap();
    assert_eq!(message, "ok");
}

#[tokio::test]
async fn logout_clears_the_stored_token() {
    let tokens = Arc::new(TokenStore::default());
    tokens.set("bearer-xyz");
    let auth = client("http://127.0.0.1:9", tokens.clone());

    auth.logout();
    assert!(tokens.get().is_none());
}
