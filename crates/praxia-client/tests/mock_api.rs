//! Mock backend tests for praxia-client.
//!
//! These tests use wiremock to simulate the Praxia backend and exercise the
//! credential, refresh and polling behavior without a live server.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use praxia_client::{ApiClient, ClientConfig, FilePart, PollOptions, Poller, SessionEvent};
use praxia_core::error::{PollError, TransportError};
use praxia_core::{
    AccessToken, ApiUrl, Credential, CredentialStore, Error, LoginCredentials,
    MemoryCredentialStore, RefreshToken, SessionKey,
};
use serde_json::json;
use tokio::sync::oneshot;
use wiremock::matchers::{body_json, header, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::default().with_api_url(ApiUrl::new(format!("{}/api", server.uri())).unwrap())
}

fn logged_in(server: &MockServer, access: &str) -> (ApiClient, Arc<MemoryCredentialStore>) {
    let store = Arc::new(MemoryCredentialStore::with_credential(
        Credential::from_parts(access, "refresh-1", "session-1").unwrap(),
    ));
    let client = ApiClient::new(config_for(server), store.clone()).unwrap();
    (client, store)
}

fn profile_body() -> serde_json::Value {
    json!({
        "username": "alice",
        "email": "alice@example.com",
        "gender": "female",
        "preferred_language": "en"
    })
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_login_stores_credential() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .and(body_json(json!({
            "email": "alice@example.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "refresh_token": "refresh-1",
            "session_key": "session-1",
            "user_id": 7,
            "email": "alice@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::with_memory_store(config_for(&server)).unwrap();
    let mut events = client.subscribe();

    let response = client
        .auth()
        .login(&LoginCredentials::new("alice@example.com", "hunter2"))
        .await
        .unwrap();

    assert_eq!(response.user_id, 7);
    assert!(client.is_authenticated());
    assert_eq!(
        client.store().get(),
        Credential::from_parts("access-1", "refresh-1", "session-1")
    );
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Established);
}

#[tokio::test]
async fn test_invalid_login_is_rejected_without_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "No active account found with the given credentials"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = ApiClient::with_memory_store(config_for(&server)).unwrap();
    let err = client
        .auth()
        .login(&LoginCredentials::new("alice@example.com", "wrong"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(
        err.user_message(),
        "No active account found with the given credentials"
    );
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn test_credentials_are_attached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/profile/"))
        .and(header("authorization", "Bearer access-1"))
        .and(header("x-session-key", "session-1"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = logged_in(&server, "access-1");
    let profile = client.profile().get().await.unwrap();

    assert_eq!(profile.username, "alice");
}

#[tokio::test]
async fn test_logout_clears_store_even_when_backend_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = logged_in(&server, "access-1");
    let mut events = client.subscribe();

    client.auth().logout().await;

    assert!(store.get().is_none());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedOut);
}

#[tokio::test]
async fn test_resend_verification_unauthorized_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/resend-verification-email/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "nope"})))
        .mount(&server)
        .await;

    let client = ApiClient::with_memory_store(config_for(&server)).unwrap();
    let err = client
        .auth()
        .resend_verification_email("alice@example.com")
        .await
        .unwrap_err();

    assert_eq!(
        err.user_message(),
        "Authentication error. Please try again or contact support."
    );
}

// ============================================================================
// Token refresh
// ============================================================================

#[tokio::test]
async fn test_expired_token_is_refreshed_transparently() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/profile/"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/profile/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token/"))
        .and(body_json(json!({
            "refresh_token": "refresh-1",
            "session_key": "session-1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "session_key": "session-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = logged_in(&server, "stale");
    let mut events = client.subscribe();

    let profile = client.profile().get().await.unwrap();

    assert_eq!(profile.email, "alice@example.com");
    let stored = store.get().unwrap();
    assert_eq!(stored.access_token.as_str(), "fresh");
    assert_eq!(stored.refresh_token.as_str(), "refresh-1");
    assert_eq!(events.recv().await.unwrap(), SessionEvent::Refreshed);
}

#[tokio::test]
async fn test_concurrent_expiry_refreshes_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/profile/"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/profile/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .expect(5)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "fresh"}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = logged_in(&server, "stale");
    let results = join_all((0..5).map(|_| {
        let client = client.clone();
        async move { client.profile().get().await }
    }))
    .await;

    for result in results {
        assert_eq!(result.unwrap().username, "alice");
    }
}

#[tokio::test]
async fn test_failed_refresh_fails_everyone_and_clears_store() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/chat-sessions/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token/"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Token is invalid or expired"}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = logged_in(&server, "stale");
    let mut events = client.subscribe();

    let results = join_all((0..3).map(|_| {
        let client = client.clone();
        async move { client.chat().list_sessions().await }
    }))
    .await;

    let messages: Vec<String> = results
        .into_iter()
        .map(|result| {
            let err = result.unwrap_err();
            assert!(err.is_auth_expired());
            err.to_string()
        })
        .collect();

    assert!(messages[0].contains("Token is invalid or expired"));
    assert!(messages.iter().all(|m| m == &messages[0]));
    assert!(store.get().is_none());
    assert!(matches!(
        events.recv().await.unwrap(),
        SessionEvent::LoginRequired { .. }
    ));
}

#[tokio::test]
async fn test_second_unauthorized_after_refresh_expires_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/profile/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;

    let (client, store) = logged_in(&server, "stale");
    let err = client.profile().get().await.unwrap_err();

    assert!(err.is_auth_expired());
    assert_eq!(
        err.user_message(),
        "Your session has expired. Please log in again."
    );
    assert!(store.get().is_none());
}

#[tokio::test]
async fn test_missing_refresh_token_expires_without_refresh_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/profile/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryCredentialStore::with_credential(Credential::new(
        AccessToken::new("stale"),
        RefreshToken::new(""),
        SessionKey::new("session-1"),
    )));
    let client = ApiClient::new(config_for(&server), store.clone()).unwrap();

    let err = client.profile().get().await.unwrap_err();

    assert!(err.is_auth_expired());
    assert!(store.get().is_none());
}

/// Store whose credential is cleared as soon as a refreshed token lands,
/// as if a logout raced the refresh.
#[derive(Debug, Default)]
struct LogoutDuringRefresh {
    inner: MemoryCredentialStore,
}

impl CredentialStore for LogoutDuringRefresh {
    fn get(&self) -> Option<Credential> {
        self.inner.get()
    }

    fn set(&self, credential: Credential) {
        self.inner.set(credential);
    }

    fn set_access_token(&self, access_token: AccessToken) {
        self.inner.set_access_token(access_token);
        self.inner.clear();
    }

    fn clear(&self) {
        self.inner.clear();
    }
}

#[tokio::test]
async fn test_cleared_credential_is_not_resent_after_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/profile/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh-token/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(LogoutDuringRefresh::default());
    store.set(Credential::from_parts("stale", "refresh-1", "session-1").unwrap());
    let client = ApiClient::new(config_for(&server), store.clone()).unwrap();

    let err = client.profile().get().await.unwrap_err();

    assert!(err.is_auth_expired());
    assert!(store.get().is_none());

    let requests = server.received_requests().await.unwrap();
    for request in &requests {
        if request.headers.contains_key("authorization") {
            assert!(
                request.headers.contains_key("x-session-key"),
                "{} {} carried a bearer token without a session key",
                request.method,
                request.url.path()
            );
        }
    }
    assert_eq!(
        requests
            .iter()
            .filter(|r| r.url.path() == "/api/profile/")
            .count(),
        1
    );
}

// ============================================================================
// Error classification
// ============================================================================

#[tokio::test]
async fn test_field_errors_are_reported() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "email": ["user with this email already exists."]
        })))
        .mount(&server)
        .await;

    let client = ApiClient::with_memory_store(config_for(&server)).unwrap();
    let err = client
        .auth()
        .register("Alice", "alice@example.com", "pw123456", "pw123456")
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(
        err.user_message(),
        "email: user with this email already exists."
    );
}

#[tokio::test]
async fn test_plain_text_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/health/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let client = ApiClient::with_memory_store(config_for(&server)).unwrap();
    let err = client.health().check().await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(err.user_message(), "Internal Server Error");
}

#[tokio::test]
async fn test_unreachable_backend_is_no_response() {
    let config = ClientConfig::default().with_api_url(ApiUrl::new("http://127.0.0.1:1/api").unwrap());
    let client = ApiClient::with_memory_store(config).unwrap();

    let err = client.health().check().await.unwrap_err();

    assert!(matches!(
        err,
        Error::Transport(TransportError::NoResponse { .. })
    ));
    assert!(err.user_message().starts_with("No response received from server."));
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/health/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": "ok"}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let config = config_for(&server).with_request_timeout(Duration::from_millis(200));
    let client = ApiClient::with_memory_store(config).unwrap();

    let err = client.health().check().await.unwrap_err();

    assert!(err.is_timeout());
    assert_eq!(err.user_message(), "Request timed out. Please try again.");
}

#[tokio::test]
async fn test_non_success_status_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/health/"))
        .respond_with(ResponseTemplate::new(304))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::with_memory_store(config_for(&server)).unwrap();
    let err = client.health().check().await.unwrap_err();

    assert_eq!(err.status(), Some(304));
    assert_eq!(err.user_message(), "Server error (304)");
}

// ============================================================================
// Uploads, chat and polling
// ============================================================================

#[tokio::test]
async fn test_xray_upload_is_multipart() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/xray-analyses/"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 12,
            "image_url": "/media/xrays/chest.png",
            "analysis_result": "Processing..."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = logged_in(&server, "access-1");
    let analysis = client
        .xray()
        .upload(FilePart::new("chest.png", vec![0x89, 0x50, 0x4e, 0x47]))
        .await
        .unwrap();

    assert_eq!(analysis.id, 12);
}

#[tokio::test]
async fn test_send_message_attaches_sources() {
    let server = MockServer::start().await;

    let answer = json!({
        "response": "Stay hydrated.",
        "related_research": [
            {"journal": "Mayo Clinic Proceedings", "title": "Hydration", "doi": "10.1/h2o", "publication_date": "2023-01-01"}
        ]
    });

    Mock::given(method("POST"))
        .and(path("/api/chat-sessions/3/messages/"))
        .and(body_json(json!({"content": "I have a headache"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "user_message": {"id": 1, "role": "user", "content": "I have a headache"},
            "ai_message": {"id": 2, "role": "assistant", "content": answer.to_string()}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = logged_in(&server, "access-1");
    let response = client
        .chat()
        .send_message(3, "I have a headache", None)
        .await
        .unwrap();

    let sources = &response.ai_message.sources;
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].source.name, "Mayo Clinic Proceedings");
    assert_eq!(sources[0].url.as_deref(), Some("https://doi.org/10.1/h2o"));
    assert_eq!(sources[0].date.as_deref(), Some("2023-01-01"));
}

#[tokio::test]
async fn test_poll_for_results_waits_for_completion() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/xray-analyses/12/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "analysis_result": "Processing..."
        })))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/xray-analyses/12/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "analysis_result": "No acute findings.",
            "confidence_scores": {"pneumonia": 0.04}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, _) = logged_in(&server, "access-1");
    let analysis = client
        .xray()
        .poll_for_results(12, Some(PollOptions::new(Duration::from_millis(20), 5)))
        .await
        .unwrap();

    assert_eq!(analysis.analysis_result, "No acute findings.");
}

#[tokio::test]
async fn test_poll_for_results_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/xray-analyses/4/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "analysis_result": "Processing..."
        })))
        .expect(3)
        .mount(&server)
        .await;

    let (client, _) = logged_in(&server, "access-1");
    let err = client
        .xray()
        .poll_for_results(4, Some(PollOptions::new(Duration::from_millis(10), 3)))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Poll(PollError::Timeout { attempts: 3 })));
}

#[tokio::test]
async fn test_watch_reports_finished_analysis() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/xray-analyses/8/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 8,
            "analysis_result": "Processing..."
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/xray-analyses/8/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 8,
            "analysis_result": "Mild cardiomegaly."
        })))
        .mount(&server)
        .await;

    let (client, _) = logged_in(&server, "access-1");
    let poller = Poller::new();
    let (tx, rx) = oneshot::channel();

    let job = client.xray().watch(
        &poller,
        8,
        Some(PollOptions::new(Duration::from_millis(20), 5)),
        move |outcome| {
            let _ = tx.send(outcome);
        },
    );

    let analysis = rx.await.unwrap().unwrap();
    assert_eq!(analysis.analysis_result, "Mild cardiomegaly.");
    assert!(!job.is_active());
    assert!(poller.is_empty());
}
