//! Persistent credential storage.
//!
//! Holds the opaque bearer token and the cached user record (as serialized
//! JSON) in a small file under the user's data directory. Every call reads or
//! rewrites the whole file; there is no locking across processes. Writes made
//! by another process are noticed through [`CredentialStore::poll_external_change`].

use serde::{Deserialize, Serialize};
use shared::User;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;
use thiserror::Error;

const STORE_FILE: &str = "session.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("credential store encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Persisted {
    #[serde(default)]
    token: Option<String>,
    /// Serialized `User` JSON
    #[serde(default)]
    user: Option<String>,
}

#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    /// Modification stamp of the file as of our last read or write
    seen: Mutex<Option<SystemTime>>,
}

impl CredentialStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let seen = Mutex::new(modified(&path));
        Self { path, seen }
    }

    pub fn default_location() -> anyhow::Result<Self> {
        let dirs = crate::config::project_dirs()?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(Self::open(data_dir.join(STORE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.filter(|t| !t.is_empty())
    }

    pub fn set_token(&self, token: &str) -> Result<(), StoreError> {
        let mut data = self.read();
        data.token = Some(token.to_string());
        self.write(&data)
    }

    /// Cached user record; `None` if absent or undecodable
    pub fn user(&self) -> Option<User> {
        let raw = self.read().user?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!("Ignoring undecodable cached user: {}", e);
                None
            }
        }
    }

    pub fn set_user(&self, user: &User) -> Result<(), StoreError> {
        let mut data = self.read();
        data.user = Some(serde_json::to_string(user)?);
        self.write(&data)
    }

    pub fn remove_token(&self) -> Result<(), StoreError> {
        let mut data = self.read();
        data.token = None;
        self.write(&data)
    }

    /// Remove both token and user
    pub fn clear(&self) -> Result<(), StoreError> {
        if !self.path.exists() {
            return Ok(());
        }
        self.write(&Persisted::default())
    }

    /// File modification stamp, `None` when the file does not exist
    pub fn revision(&self) -> Option<SystemTime> {
        modified(&self.path)
    }

    /// True once per write made by someone other than this store
    pub fn poll_external_change(&self) -> bool {
        let current = self.revision();
        let mut seen = match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *seen != current {
            *seen = current;
            true
        } else {
            false
        }
    }

    fn read(&self) -> Persisted {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return Persisted::default(),
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Credential store {} is corrupt, treating as empty: {}", self.path.display(), e);
            Persisted::default()
        })
    }

    fn write(&self, data: &Persisted) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(data)?)?;
        std::fs::rename(&tmp, &self.path)?;

        let mut seen = match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *seen = modified(&self.path);
        Ok(())
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Role;

    fn sample_user() -> User {
        User {
            id: 1,
            username: "anna".to_string(),
            email: "anna@example.com".to_string(),
            role: Role::Customer,
            first_name: None,
            last_name: None,
            created_at: Some("2024-01-01T00:00:00".to_string()),
        }
    }

    #[test]
    fn test_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::open(dir.path().join("session.json"));
        assert!(store.token().is_none());
        assert!(store.user().is_none());
        assert!(store.revision().is_none());
        store.clear().unwrap();
    }

    #[test]
    fn test_token_and_user_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");
        let store = CredentialStore::open(&path);
        store.set_token("abc.def").unwrap();
        store.set_user(&sample_user()).unwrap();

        let reopened = CredentialStore::open(&path);
        assert_eq!(reopened.token().as_deref(), Some("abc.def"));
        assert_eq!(reopened.user(), Some(sample_user()));

        reopened.clear().unwrap();
        assert!(store.token().is_none());
        assert!(store.user().is_none());
    }

    #[test]
    fn test_remove_token_keeps_user() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::open(dir.path().join("session.json"));
        store.set_token("t").unwrap();
        store.set_user(&sample_user()).unwrap();
        store.remove_token().unwrap();
        assert!(store.token().is_none());
        assert!(store.user().is_some());
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = CredentialStore::open(&path);
        assert!(store.token().is_none());

        std::fs::write(&path, r#"{"token":"t","user":"{broken"}"#).unwrap();
        assert_eq!(store.token().as_deref(), Some("t"));
        assert!(store.user().is_none());
    }

    #[test]
    fn test_own_writes_are_not_external_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = CredentialStore::open(&path);
        store.set_token("mine").unwrap();
        assert!(!store.poll_external_change());

        // another process logs out
        std::fs::remove_file(&path).unwrap();
        assert!(store.poll_external_change());
        assert!(!store.poll_external_change());
    }
}
