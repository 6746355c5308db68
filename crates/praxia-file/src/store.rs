//! Credential persistence on the local filesystem.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use praxia_core::error::{Error, TransportError};
use praxia_core::{AccessToken, Credential, CredentialStore, Result};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

fn map_io(err: io::Error) -> Error {
    Error::Transport(TransportError::Http {
        message: format!("IO error: {}", err),
    })
}

/// On-disk layout: the three credential strings, cleared together.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCredential {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    refresh_token: String,
    #[serde(default)]
    session_key: String,
}

impl From<&Credential> for StoredCredential {
    fn from(credential: &Credential) -> Self {
        Self {
            access_token: credential.access_token.as_str().to_string(),
            refresh_token: credential.refresh_token.as_str().to_string(),
            session_key: credential.session_key.as_str().to_string(),
        }
    }
}

/// Credential store persisted as a JSON file.
///
/// The in-memory copy is authoritative; every mutation is written through to
/// disk under an exclusive advisory lock. Write failures are logged and do not
/// reach callers, so the store behaves like browser storage from the client's
/// point of view.
///
/// With [`clear_on_drop`](Self::clear_on_drop) enabled the credential is
/// removed when the store is dropped, giving per-tab session semantics.
pub struct FileCredentialStore {
    path: PathBuf,
    credential: RwLock<Option<Credential>>,
    clear_on_drop: bool,
}

impl FileCredentialStore {
    /// Open the store at `path`, loading any credential already saved there.
    ///
    /// A file with a missing or empty field, or one that is not valid JSON,
    /// is treated as no credential and removed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(map_io)?;
        }

        let credential = Self::load(&path)?;

        Ok(Self {
            path,
            credential: RwLock::new(credential),
            clear_on_drop: false,
        })
    }

    /// Remove the stored credential when this store is dropped.
    pub fn clear_on_drop(mut self, enabled: bool) -> Self {
        self.clear_on_drop = enabled;
        self
    }

    /// Path of the credential file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    fn load(path: &Path) -> Result<Option<Credential>> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(map_io(err)),
        };

        let credential = serde_json::from_str::<StoredCredential>(&json)
            .ok()
            .and_then(|stored| {
                Credential::from_parts(stored.access_token, stored.refresh_token, stored.session_key)
            });

        if credential.is_none() {
            warn!(path = %path.display(), "Discarding incomplete credential file");
            fs::remove_file(path).map_err(map_io)?;
        } else {
            debug!(path = %path.display(), "Loaded stored credential");
        }

        Ok(credential)
    }

    fn persist(&self, credential: Option<&Credential>) -> io::Result<()> {
        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;

        lock_file.lock_exclusive()?;

        let result = match credential {
            Some(credential) => self.write_file(&StoredCredential::from(credential)),
            None => match fs::remove_file(&self.path) {
                Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
                _ => Ok(()),
            },
        };

        lock_file.unlock()?;
        result
    }

    fn write_file(&self, stored: &StoredCredential) -> io::Result<()> {
        let json = serde_json::to_string_pretty(stored)?;
        let tmp_path = self.path.with_extension("tmp");

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;

        // Set restrictive permissions before any secret is written (Unix only)
        #[cfg(unix)]
        file.set_permissions(fs::Permissions::from_mode(0o600))?;

        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        drop(file);

        // Rename so readers never observe a half-written credential
        fs::rename(&tmp_path, &self.path)
    }

    fn write_through(&self, credential: Option<&Credential>) {
        if let Err(err) = self.persist(credential) {
            warn!(path = %self.path.display(), error = %err, "Failed to persist credential");
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.credential
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set(&self, credential: Credential) {
        let mut guard = self
            .credential
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.write_through(Some(&credential));
        *guard = Some(credential);
    }

    fn set_access_token(&self, access_token: AccessToken) {
        let mut guard = self
            .credential
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(credential) = guard.as_mut() {
            credential.access_token = access_token;
            self.write_through(Some(&*credential));
        }
    }

    fn clear(&self) {
        let mut guard = self
            .credential
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
        self.write_through(None);
    }
}

impl Drop for FileCredentialStore {
    fn drop(&mut self) {
        if self.clear_on_drop {
            debug!(path = %self.path.display(), "Clearing credential at end of scope");
            self.clear();
        }
    }
}

impl fmt::Debug for FileCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileCredentialStore")
            .field("path", &self.path)
            .field("credential", &"[REDACTED]")
            .field("clear_on_drop", &self.clear_on_drop)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn credential() -> Credential {
        Credential::from_parts("access-1", "refresh-1", "session-1").unwrap()
    }

    #[test]
    fn credential_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credential.json");

        let store = FileCredentialStore::open(&path).unwrap();
        assert!(store.get().is_none());
        store.set(credential());
        drop(store);

        let reopened = FileCredentialStore::open(&path).unwrap();
        assert_eq!(reopened.get(), Some(credential()));
    }

    #[test]
    fn file_uses_three_string_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credential.json");

        FileCredentialStore::open(&path).unwrap().set(credential());

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["access_token"], "access-1");
        assert_eq!(json["refresh_token"], "refresh-1");
        assert_eq!(json["session_key"], "session-1");
    }

    #[test]
    fn clear_removes_file_and_all_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credential.json");

        let store = FileCredentialStore::open(&path).unwrap();
        store.set(credential());
        store.clear();

        assert!(store.get().is_none());
        assert!(!path.exists());
        assert!(FileCredentialStore::open(&path).unwrap().get().is_none());
    }

    #[test]
    fn access_token_refresh_is_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credential.json");

        let store = FileCredentialStore::open(&path).unwrap();
        store.set(credential());
        store.set_access_token(AccessToken::new("access-2"));
        drop(store);

        let stored = FileCredentialStore::open(&path).unwrap().get().unwrap();
        assert_eq!(stored.access_token.as_str(), "access-2");
        assert_eq!(stored.session_key.as_str(), "session-1");
    }

    #[test]
    fn partial_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credential.json");
        fs::write(&path, r#"{"access_token": "a", "refresh_token": "r"}"#).unwrap();

        let store = FileCredentialStore::open(&path).unwrap();
        assert!(store.get().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn clear_on_drop_removes_credential() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credential.json");

        let store = FileCredentialStore::open(&path).unwrap().clear_on_drop(true);
        store.set(credential());
        assert!(path.exists());
        drop(store);

        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn file_is_private() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credential.json");

        FileCredentialStore::open(&path).unwrap().set(credential());

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
