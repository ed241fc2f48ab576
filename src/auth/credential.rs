//! Durable storage for the access token.
//!
//! The token lives outside the response cache, together with the time of
//! its last refresh. It is read by the gateway on every request and
//! written only by the refresh coordinator and the login/logout flows.

use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Result, SatchelError};

/// Access token plus the time it was issued or last refreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    /// Unix timestamp (seconds) of the last refresh.
    pub refreshed_at: u64,
}

impl StoredCredential {
    /// Wrap a freshly issued token, stamped with the current time.
    pub fn issued_now(access_token: impl Into<String>) -> Self {
        let refreshed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            access_token: access_token.into(),
            refreshed_at,
        }
    }
}

/// Client-durable key/value storage for the session credential.
pub trait CredentialStore: Send + Sync {
    /// Current credential, if any.
    fn load(&self) -> Option<StoredCredential>;

    /// Persist a credential, replacing the previous one.
    fn save(&self, credential: &StoredCredential) -> Result<()>;

    /// Forget the credential. Idempotent.
    fn clear(&self) -> Result<()>;

    /// Shorthand for the current access token.
    fn access_token(&self) -> Option<String> {
        self.load().map(|c| c.access_token)
    }
}

/// Process-local credential store. Lost on exit.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Option<StoredCredential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            credential: RwLock::new(Some(StoredCredential::issued_now(token))),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Option<StoredCredential> {
        self.credential
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn save(&self, credential: &StoredCredential) -> Result<()> {
        let mut guard = self
            .credential
            .write()
            .map_err(|_| SatchelError::Storage("credential lock poisoned".into()))?;
        *guard = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .credential
            .write()
            .map_err(|_| SatchelError::Storage("credential lock poisoned".into()))?;
        *guard = None;
        Ok(())
    }
}

/// Credential store backed by a JSON file.
///
/// Default location: `~/.config/satchel/credentials.json`. A missing file
/// means "no credential"; a corrupt one is logged and treated the same.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default per-user location.
    pub fn default_location() -> Self {
        Self::new(default_credentials_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Default path: `~/.config/satchel/credentials.json`.
pub fn default_credentials_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("satchel")
        .join("credentials.json")
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Option<StoredCredential> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read credentials");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt credentials file");
                None
            }
        }
    }

    /// Atomic write via tmp + rename.
    fn save(&self, credential: &StoredCredential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SatchelError::Storage(format!(
                    "failed to create credentials dir {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(credential)?;
        std::fs::write(&tmp_path, json).map_err(|e| {
            SatchelError::Storage(format!("failed to write {}: {e}", tmp_path.display()))
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            SatchelError::Storage(format!(
                "failed to rename {} → {}: {e}",
                tmp_path.display(),
                self.path.display()
            ))
        })
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SatchelError::Storage(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}
