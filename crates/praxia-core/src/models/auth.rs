//! Authentication, session and 2FA bodies.

use serde::{Deserialize, Serialize};

use crate::credentials::Credential;

/// Request body for `auth/register/`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub password2: &'a str,
}

/// Request body for `auth/login/`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Response from login, registration, email verification and password reset.
///
/// Token fields are empty when the backend accepts the request without
/// opening a session (for example, registration pending email verification).
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub session_key: String,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub has_2fa: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AuthResponse {
    /// The session credential carried by this response, if complete.
    pub fn credential(&self) -> Option<Credential> {
        Credential::from_parts(
            self.access_token.as_str(),
            self.refresh_token.as_str(),
            self.session_key.as_str(),
        )
    }
}

/// Request body for `auth/refresh-token/`.
#[derive(Debug, Serialize)]
pub struct RefreshTokenRequest<'a> {
    pub refresh_token: &'a str,
    pub session_key: &'a str,
}

/// Response from `auth/refresh-token/`.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub session_key: Option<String>,
}

/// Body carrying a single one-time token (email verification, 2FA code).
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub token: &'a str,
}

/// Body carrying a single email address.
#[derive(Debug, Serialize)]
pub struct EmailRequest<'a> {
    pub email: &'a str,
}

/// Request body for `auth/password-reset-confirm/`.
#[derive(Debug, Serialize)]
pub struct PasswordResetConfirmRequest<'a> {
    pub token: &'a str,
    pub password: &'a str,
    pub password2: &'a str,
}

/// Response from `auth/check-email-verification/`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailVerificationStatus {
    pub is_verified: bool,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub email: String,
}

/// A login session as listed by `auth/sessions/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSession {
    pub session_key: String,
    #[serde(default)]
    pub device_info: String,
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_activity: String,
    #[serde(default)]
    pub is_current: bool,
}

/// Response from `auth/sessions/`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserSessionsResponse {
    #[serde(default)]
    pub sessions: Vec<UserSession>,
}

/// Request body for terminating a session.
#[derive(Debug, Serialize)]
pub struct TerminateSessionRequest<'a> {
    pub session_key: &'a str,
}

/// Response from `auth/2fa/setup/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TotpSetupResponse {
    pub qr_code: String,
    #[serde(default)]
    pub created_at: String,
}

/// Response from `auth/2fa/verify/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TotpVerifyResponse {
    #[serde(default)]
    pub message: String,
    pub is_verified: bool,
}

/// Response from `auth/2fa/status/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TotpStatus {
    pub has_2fa: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn auth_response_yields_credential() {
        let response: AuthResponse = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "session_key": "s",
            "user_id": 7,
            "email": "alice@example.com"
        }))
        .unwrap();

        let credential = response.credential().unwrap();
        assert_eq!(credential.session_key.as_str(), "s");
        assert_eq!(response.user_id, 7);
    }

    #[test]
    fn auth_response_without_tokens_has_no_credential() {
        let response: AuthResponse = serde_json::from_value(json!({
            "user_id": 7,
            "email": "alice@example.com",
            "message": "Check your inbox"
        }))
        .unwrap();

        assert!(response.credential().is_none());
        assert_eq!(response.message.as_deref(), Some("Check your inbox"));
    }
}
