//! Login credentials and the stored session credential.

use std::fmt;

use crate::tokens::{AccessToken, RefreshToken, SessionKey};

/// Email and password used to authenticate with the backend.
///
/// # Security
///
/// The password is never exposed in Debug output to prevent accidental logging.
///
/// # Example
///
/// ```
/// use praxia_core::LoginCredentials;
///
/// let creds = LoginCredentials::new("alice@example.com", "hunter2");
/// assert_eq!(creds.email(), "alice@example.com");
/// ```
#[derive(Clone)]
pub struct LoginCredentials {
    email: String,
    password: String,
}

impl LoginCredentials {
    /// Create new login credentials.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Returns the account email.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Returns the password.
    ///
    /// Use this only when constructing authentication requests.
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// The credential set held by a [`CredentialStore`](crate::CredentialStore).
///
/// The access token and session key are kept in one value so that one is
/// never sent without the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub session_key: SessionKey,
}

impl Credential {
    pub fn new(
        access_token: AccessToken,
        refresh_token: RefreshToken,
        session_key: SessionKey,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            session_key,
        }
    }

    /// Build a credential from raw strings, returning `None` if any is empty.
    pub fn from_parts(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        session_key: impl Into<String>,
    ) -> Option<Self> {
        let credential = Self::new(
            AccessToken::new(access_token),
            RefreshToken::new(refresh_token),
            SessionKey::new(session_key),
        );
        credential.is_complete().then_some(credential)
    }

    /// Returns true if all three fields are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty()
            && !self.refresh_token.is_empty()
            && !self.session_key.is_empty()
    }

    /// Replace the access token, keeping the refresh token and session key.
    pub fn with_access_token(mut self, access_token: AccessToken) -> Self {
        self.access_token = access_token;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_credentials_hide_password_in_debug() {
        let creds = LoginCredentials::new("alice@example.com", "secret123");
        let debug = format!("{:?}", creds);
        assert!(debug.contains("alice@example.com"));
        assert!(!debug.contains("secret123"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn from_parts_rejects_empty_fields() {
        assert!(Credential::from_parts("a", "r", "s").is_some());
        assert!(Credential::from_parts("", "r", "s").is_none());
        assert!(Credential::from_parts("a", "", "s").is_none());
        assert!(Credential::from_parts("a", "r", "").is_none());
    }

    #[test]
    fn with_access_token_keeps_session_key() {
        let credential = Credential::from_parts("old", "refresh", "session").unwrap();
        let updated = credential.with_access_token(AccessToken::new("new"));
        assert_eq!(updated.access_token.as_str(), "new");
        assert_eq!(updated.session_key.as_str(), "session");
    }
}
