//! Account, session and two-factor endpoints.

use tracing::{debug, info, instrument, warn};

use praxia_core::error::ProtocolError;
use praxia_core::models::{
    AuthResponse, EmailRequest, EmailVerificationStatus, LoginRequest, MessageResponse,
    PasswordResetConfirmRequest, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest,
    TerminateSessionRequest, TokenRequest, TotpSetupResponse, TotpStatus, TotpVerifyResponse,
    UserSessionsResponse,
};
use praxia_core::{Error, LoginCredentials, Result};

use crate::client::ApiClient;
use crate::endpoints;
use crate::request::ApiRequest;

const RESEND_AUTH_MESSAGE: &str = "Authentication error. Please try again or contact support.";

/// Authentication endpoints.
#[derive(Debug, Clone, Copy)]
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Create an account. The backend usually requires email verification
    /// before it hands out a session, so nothing is stored here.
    #[instrument(skip(self, password, password2))]
    pub async fn register(
        &self,
        full_name: &str,
        email: &str,
        password: &str,
        password2: &str,
    ) -> Result<AuthResponse> {
        let request = ApiRequest::post(endpoints::REGISTER)
            .public()
            .json(&RegisterRequest {
                full_name,
                email,
                password,
                password2,
            })?;
        self.client.request(request).await
    }

    /// Log in and store the returned credential.
    #[instrument(skip(self, credentials), fields(email = credentials.email()))]
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse> {
        let request = ApiRequest::post(endpoints::LOGIN)
            .public()
            .json(&LoginRequest {
                email: credentials.email(),
                password: credentials.password(),
            })?;

        let response: AuthResponse = self.client.request(request).await?;
        self.store_session(&response);
        Ok(response)
    }

    /// End this session. The local credential is cleared even if the
    /// backend call fails.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.end(endpoints::LOGOUT).await;
    }

    /// End every session of this account.
    #[instrument(skip(self))]
    pub async fn logout_all(&self) {
        self.end(endpoints::LOGOUT_ALL).await;
    }

    async fn end(&self, path: &str) {
        if let Err(err) = self.client.request_empty(ApiRequest::post(path)).await {
            warn!(error = %err, path, "Logout call failed; clearing local session anyway");
        }
        self.client.end_session();
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Stores nothing. Requests needing a refresh go through the client's
    /// coordinator instead, see [`ApiClient::refresh_access_token`].
    #[instrument(skip_all)]
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
        session_key: &str,
    ) -> Result<RefreshTokenResponse> {
        let request = ApiRequest::post(endpoints::REFRESH_TOKEN)
            .public()
            .json(&RefreshTokenRequest {
                refresh_token,
                session_key,
            })?;
        self.client.request(request).await
    }

    /// Confirm an email address and store the session it opens.
    #[instrument(skip_all)]
    pub async fn verify_email(&self, token: &str) -> Result<AuthResponse> {
        let request = ApiRequest::post(endpoints::VERIFY_EMAIL)
            .public()
            .json(&TokenRequest { token })?;

        let response: AuthResponse = self.client.request(request).await?;
        self.store_session(&response);
        Ok(response)
    }

    #[instrument(skip(self))]
    pub async fn resend_verification_email(&self, email: &str) -> Result<MessageResponse> {
        let request = ApiRequest::post(endpoints::RESEND_VERIFICATION_EMAIL)
            .public()
            .json(&EmailRequest { email })?;

        self.client
            .request(request)
            .await
            .map_err(|err| match err {
                Error::Protocol(rejected) if rejected.is_auth_error() => {
                    ProtocolError::new(rejected.status, RESEND_AUTH_MESSAGE).into()
                }
                other => other,
            })
    }

    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<MessageResponse> {
        let request = ApiRequest::post(endpoints::PASSWORD_RESET_REQUEST)
            .public()
            .json(&EmailRequest { email })?;
        self.client.request(request).await
    }

    /// Set a new password from a reset token and store the session it opens.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        token: &str,
        password: &str,
        password2: &str,
    ) -> Result<AuthResponse> {
        let request = ApiRequest::post(endpoints::PASSWORD_RESET_CONFIRM)
            .public()
            .json(&PasswordResetConfirmRequest {
                token,
                password,
                password2,
            })?;

        let response: AuthResponse = self.client.request(request).await?;
        self.store_session(&response);
        Ok(response)
    }

    #[instrument(skip(self))]
    pub async fn check_email_verification(&self, email: &str) -> Result<EmailVerificationStatus> {
        let request = ApiRequest::post(endpoints::CHECK_EMAIL_VERIFICATION)
            .public()
            .json(&EmailRequest { email })?;
        self.client.request(request).await
    }

    /// List the account's active sessions.
    #[instrument(skip(self))]
    pub async fn sessions(&self) -> Result<UserSessionsResponse> {
        self.client.request(ApiRequest::get(endpoints::SESSIONS)).await
    }

    /// Terminate another session by its key.
    #[instrument(skip_all)]
    pub async fn terminate_session(&self, session_key: &str) -> Result<MessageResponse> {
        let request =
            ApiRequest::delete(endpoints::SESSIONS).json(&TerminateSessionRequest { session_key })?;
        self.client.request(request).await
    }

    /// Start two-factor setup; the response carries the QR code to scan.
    #[instrument(skip(self))]
    pub async fn setup_totp(&self) -> Result<TotpSetupResponse> {
        self.client.request(ApiRequest::get(endpoints::TOTP_SETUP)).await
    }

    #[instrument(skip_all)]
    pub async fn verify_totp(&self, token: &str) -> Result<TotpVerifyResponse> {
        let request = ApiRequest::post(endpoints::TOTP_VERIFY).json(&TokenRequest { token })?;
        self.client.request(request).await
    }

    #[instrument(skip(self))]
    pub async fn disable_totp(&self) -> Result<MessageResponse> {
        self.client.request(ApiRequest::post(endpoints::TOTP_DISABLE)).await
    }

    #[instrument(skip(self))]
    pub async fn totp_status(&self) -> Result<TotpStatus> {
        self.client.request(ApiRequest::get(endpoints::TOTP_STATUS)).await
    }

    fn store_session(&self, response: &AuthResponse) {
        match response.credential() {
            Some(credential) => {
                info!(user_id = response.user_id, "Storing session credential");
                self.client.establish(credential);
            }
            None => debug!("Response carried no session credential"),
        }
    }
}
