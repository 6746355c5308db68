//! Session-aware request dispatcher.
//!
//! [`ApiClient`] is cheap to clone. Every clone shares the HTTP connection
//! pool, the credential store and the refresh coordinator, so a refresh
//! started by one clone is observed by requests made through any other.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, trace, warn};

use praxia_core::error::{AuthError, InvalidInputError, ProtocolError, TransportError};
use praxia_core::models::{RefreshTokenRequest, RefreshTokenResponse};
use praxia_core::{
    AccessToken, Credential, CredentialStore, Error, MemoryCredentialStore, Result,
};

use crate::api::{AuthApi, ChatApi, ConsultationApi, HealthApi, ProfileApi, ResearchApi, XrayApi};
use crate::config::ClientConfig;
use crate::endpoints;
use crate::events::SessionEvent;
use crate::refresh::{Acquire, RefreshCoordinator};
use crate::request::{ApiRequest, RequestBody};

const SESSION_KEY_HEADER: &str = "X-Session-Key";
const EVENT_CAPACITY: usize = 16;

/// Client for the Praxia API.
///
/// Attaches the stored credential to every request, refreshes the access
/// token once when a request comes back 401 and replays the request, and
/// clears the credential when the session cannot be recovered.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    config: ClientConfig,
    store: Arc<dyn CredentialStore>,
    refresh: RefreshCoordinator,
    events: broadcast::Sender<SessionEvent>,
}

impl ApiClient {
    /// Create a client backed by the given credential store.
    pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| TransportError::Http {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        debug!(api_url = %config.api_url, "Created API client");

        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                store,
                refresh: RefreshCoordinator::new(),
                events,
            }),
        })
    }

    /// Create a client whose credential lives only as long as the client.
    pub fn with_memory_store(config: ClientConfig) -> Result<Self> {
        Self::new(config, Arc::new(MemoryCredentialStore::new()))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    /// Subscribe to session lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Returns true if an access token is stored.
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .store
            .get()
            .is_some_and(|credential| !credential.access_token.is_empty())
    }

    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn profile(&self) -> ProfileApi<'_> {
        ProfileApi::new(self)
    }

    pub fn chat(&self) -> ChatApi<'_> {
        ChatApi::new(self)
    }

    pub fn consultations(&self) -> ConsultationApi<'_> {
        ConsultationApi::new(self)
    }

    pub fn xray(&self) -> XrayApi<'_> {
        XrayApi::new(self)
    }

    pub fn research(&self) -> ResearchApi<'_> {
        ResearchApi::new(self)
    }

    pub fn health(&self) -> HealthApi<'_> {
        HealthApi::new(self)
    }

    /// Send a request and decode the JSON response.
    #[instrument(skip(self, request), fields(method = %request.method(), path = request.path()))]
    pub async fn request<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        let timeout = self.deadline(&request);
        let response = self.dispatch(request).await?;
        decode(response, timeout).await
    }

    /// Send a request whose response body is ignored.
    #[instrument(skip(self, request), fields(method = %request.method(), path = request.path()))]
    pub async fn request_empty(&self, request: ApiRequest) -> Result<()> {
        self.dispatch(request).await?;
        Ok(())
    }

    async fn dispatch(&self, mut request: ApiRequest) -> Result<reqwest::Response> {
        let mut token_override: Option<AccessToken> = None;

        loop {
            let credential = match (token_override.take(), self.inner.store.get()) {
                (Some(token), Some(credential)) if !credential.session_key.is_empty() => {
                    Some(credential.with_access_token(token))
                }
                (Some(_), _) => {
                    warn!("Credential cleared before retry; not resending request");
                    return Err(AuthError::expired("credential was cleared during refresh").into());
                }
                (None, credential) => credential,
            };
            let sent_token = credential.as_ref().map(|c| c.access_token.clone());

            let response = self.send(&request, credential.as_ref()).await?;
            let status = response.status();
            trace!(status = %status, retried = request.is_retried(), "Response received");

            if status.is_success() {
                return Ok(response);
            }

            if status != StatusCode::UNAUTHORIZED || !request.is_authenticated() {
                return Err(self.rejected(response).await);
            }

            if request.is_retried() {
                return Err(self.expire("request was rejected again after refreshing the session"));
            }
            request.mark_retried();

            // Another request may have refreshed while this one was in flight.
            let current = self.inner.store.get().map(|c| c.access_token);
            if let Some(current) = current.filter(|t| !t.is_empty() && Some(t) != sent_token.as_ref()) {
                debug!("Access token changed since request was sent; retrying without refresh");
                token_override = Some(current);
                continue;
            }

            token_override = Some(self.refresh_access_token().await?);
            debug!("Retrying request with refreshed access token");
        }
    }

    async fn send(
        &self,
        request: &ApiRequest,
        credential: Option<&Credential>,
    ) -> Result<reqwest::Response> {
        let url = self.inner.config.api_url.endpoint(request.path());
        let timeout = self.deadline(request);
        debug!(method = %request.method(), %url, "Sending request");

        let mut builder = self
            .inner
            .http
            .request(request.method().clone(), &url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .timeout(timeout);

        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }

        // The bearer token only travels with its session key.
        if let Some(credential) =
            credential.filter(|c| !c.access_token.is_empty() && !c.session_key.is_empty())
        {
            let bearer = format!("Bearer {}", credential.access_token.as_str());
            builder = builder
                .header(AUTHORIZATION, header_value(AUTHORIZATION.as_str(), &bearer)?)
                .header(
                    SESSION_KEY_HEADER,
                    header_value(SESSION_KEY_HEADER, credential.session_key.as_str())?,
                );
        }

        if let Some(content_type) = request.effective_content_type() {
            builder = builder.header(CONTENT_TYPE, header_value(CONTENT_TYPE.as_str(), content_type)?);
        }

        builder = match request.body() {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.body(value.to_string()),
            RequestBody::Multipart(form) => builder.multipart(form.to_form()?),
        };

        builder
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))
    }

    fn deadline(&self, request: &ApiRequest) -> Duration {
        request
            .timeout_override()
            .unwrap_or(self.inner.config.request_timeout)
    }

    async fn rejected(&self, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let error = ProtocolError::from_body(status, &body);
        warn!(status, message = %error.message, "Request rejected");
        Error::Protocol(error)
    }

    /// Refresh the access token, or wait for the refresh already in flight.
    ///
    /// On failure the credential is cleared and every caller receives the
    /// same `AuthExpired` error.
    pub async fn refresh_access_token(&self) -> Result<AccessToken> {
        match self.inner.refresh.acquire_or_wait() {
            Acquire::Wait(waiter) => waiter.wait().await,
            Acquire::Lead(lease) => {
                let outcome = match self.perform_refresh().await {
                    Ok(token) => {
                        self.inner.store.set_access_token(token.clone());
                        info!("Access token refreshed");
                        self.emit(SessionEvent::Refreshed);
                        Ok(token)
                    }
                    Err(err) => {
                        let reason = match &err {
                            Error::Auth(AuthError::AuthExpired { reason }) => reason.clone(),
                            other => format!("token refresh failed: {}", other),
                        };
                        Err(self.expire(reason))
                    }
                };
                lease.settle(outcome)
            }
        }
    }

    /// Call the refresh endpoint directly. Never recurses into refresh.
    async fn perform_refresh(&self) -> Result<AccessToken> {
        let credential = self
            .inner
            .store
            .get()
            .filter(|c| !c.refresh_token.is_empty() && !c.session_key.is_empty())
            .ok_or_else(|| AuthError::expired("no refresh token available"))?;

        let request = ApiRequest::post(endpoints::REFRESH_TOKEN)
            .public()
            .json(&RefreshTokenRequest {
                refresh_token: credential.refresh_token.as_str(),
                session_key: credential.session_key.as_str(),
            })?;
        let timeout = self.deadline(&request);

        let response = self.send(&request, Some(&credential)).await?;
        if !response.status().is_success() {
            return Err(self.rejected(response).await);
        }

        let body: RefreshTokenResponse = decode(response, timeout).await?;
        if body.access_token.is_empty() {
            return Err(AuthError::expired("refresh response carried no access token").into());
        }
        Ok(AccessToken::new(body.access_token))
    }

    /// Clear the credential, tell subscribers a login is needed, and return
    /// the error to hand back to the caller.
    fn expire(&self, reason: impl Into<String>) -> Error {
        let reason = reason.into();
        warn!(%reason, "Session expired; clearing credential");
        self.inner.store.clear();
        self.emit(SessionEvent::LoginRequired {
            reason: reason.clone(),
        });
        AuthError::expired(reason).into()
    }

    pub(crate) fn establish(&self, credential: Credential) {
        self.inner.store.set(credential);
        info!("Session established");
        self.emit(SessionEvent::Established);
    }

    pub(crate) fn end_session(&self) {
        self.inner.store.clear();
        info!("Session ended");
        self.emit(SessionEvent::LoggedOut);
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_url", &self.inner.config.api_url)
            .field("store", &self.inner.store)
            .field("refreshing", &self.inner.refresh.is_refreshing())
            .finish()
    }
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| {
        InvalidInputError::Header {
            name: name.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

async fn decode<R: DeserializeOwned>(response: reqwest::Response, timeout: Duration) -> Result<R> {
    let bytes = response
        .bytes()
        .await
        .map_err(|e| transport_error(e, timeout))?;

    serde_json::from_slice(&bytes).map_err(|e| {
        InvalidInputError::Decode {
            message: e.to_string(),
        }
        .into()
    })
}

fn transport_error(err: reqwest::Error, timeout: Duration) -> Error {
    if err.is_timeout() {
        TransportError::Timeout {
            duration_ms: timeout.as_millis() as u64,
        }
        .into()
    } else if err.is_builder() {
        InvalidInputError::Other {
            message: err.to_string(),
        }
        .into()
    } else if err.is_connect() || err.is_request() {
        TransportError::NoResponse {
            message: err.to_string(),
        }
        .into()
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
        .into()
    }
}
