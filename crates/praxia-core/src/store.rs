//! Credential storage.
//!
//! A [`CredentialStore`] owns the current [`Credential`] for the lifetime of
//! a client session. It is injected into the request dispatcher rather than
//! reached through global state, so every component that reads or evicts
//! credentials does so through the same handle.

use std::fmt;
use std::sync::RwLock;

use crate::credentials::Credential;
use crate::tokens::AccessToken;

/// Holder of the access token, refresh token and session key.
///
/// Operations are local mutations and never fail. Implementations must make
/// `clear` remove all three fields at once.
pub trait CredentialStore: fmt::Debug + Send + Sync {
    /// Returns the current credential, if any.
    fn get(&self) -> Option<Credential>;

    /// Replace the stored credential.
    fn set(&self, credential: Credential);

    /// Replace only the access token after a refresh.
    ///
    /// Does nothing when no credential is stored, so a refresh that races a
    /// logout cannot resurrect a half-populated credential.
    fn set_access_token(&self, access_token: AccessToken) {
        if let Some(credential) = self.get() {
            self.set(credential.with_access_token(access_token));
        }
    }

    /// Remove the credential.
    fn clear(&self);
}

/// In-memory credential store. Credentials live as long as the store.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with a credential.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.credential
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set(&self, credential: Credential) {
        *self
            .credential
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(credential);
    }

    fn set_access_token(&self, access_token: AccessToken) {
        let mut guard = self
            .credential
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(credential) = guard.as_mut() {
            credential.access_token = access_token;
        }
    }

    fn clear(&self) {
        *self
            .credential
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

impl fmt::Debug for MemoryCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCredentialStore")
            .field("has_credential", &self.get().is_some())
            .finish()
    }
}
