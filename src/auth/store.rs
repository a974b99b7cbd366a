use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Credential file name in the storage directory
const CREDENTIALS_FILE: &str = "credentials.json";

/// Which of the two stored credentials an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    /// Short-lived bearer token attached to API calls
    Access,
    /// Longer-lived token used only to obtain a new access token
    Refresh,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredSession {
    access_token: Option<String>,
    refresh_token: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

/// Durable access/refresh credential pair.
///
/// Created on successful login, the access half replaced on every
/// successful refresh, and cleared entirely on logout or a forced
/// redirect. Mutations are whole-key replacements, so last-write-wins
/// is safe for concurrent callers: the newest access credential always
/// wins, and a cleared store simply forces re-authentication.
///
/// Shared as `Arc<CredentialStore>` and injected into the request
/// client and the route guards rather than living in a global.
pub struct CredentialStore {
    path: PathBuf,
    inner: RwLock<StoredSession>,
}

impl CredentialStore {
    /// Open the store backed by `credentials.json` under `dir`.
    ///
    /// A missing or unreadable file yields an empty session rather than
    /// an error; stale state only ever costs the user a fresh login.
    pub fn open(dir: &Path) -> Self {
        let path = dir.join(CREDENTIALS_FILE);
        let session = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(session) => session,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Corrupt credential file, starting empty");
                    StoredSession::default()
                }
            },
            Err(_) => StoredSession::default(),
        };
        Self {
            path,
            inner: RwLock::new(session),
        }
    }

    /// Get a stored credential, if present.
    pub fn get(&self, kind: CredentialKind) -> Option<String> {
        let session = self.inner.read().unwrap_or_else(|e| e.into_inner());
        match kind {
            CredentialKind::Access => session.access_token.clone(),
            CredentialKind::Refresh => session.refresh_token.clone(),
        }
    }

    /// Replace a stored credential and persist the session.
    ///
    /// The in-memory value is updated even when persistence fails, so
    /// the current process keeps working; the error reports the lost
    /// durability.
    pub fn set(&self, kind: CredentialKind, value: &str) -> Result<()> {
        let snapshot = {
            let mut session = self.inner.write().unwrap_or_else(|e| e.into_inner());
            match kind {
                CredentialKind::Access => session.access_token = Some(value.to_string()),
                CredentialKind::Refresh => session.refresh_token = Some(value.to_string()),
            }
            session.updated_at = Some(Utc::now());
            session.clone()
        };
        self.persist(&snapshot)
    }

    /// Remove both credentials and the persisted file.
    ///
    /// Idempotent: clearing an already-empty store is not an error.
    pub fn clear(&self) -> Result<()> {
        {
            let mut session = self.inner.write().unwrap_or_else(|e| e.into_inner());
            *session = StoredSession::default();
        }
        if self.path.exists() {
            std::fs::remove_file(&self.path).with_context(|| {
                format!("Failed to remove credential file {}", self.path.display())
            })?;
        }
        Ok(())
    }

    /// True iff an access credential is present and non-empty.
    ///
    /// A refresh credential alone never counts as authenticated.
    pub fn is_authenticated(&self) -> bool {
        let session = self.inner.read().unwrap_or_else(|e| e.into_inner());
        session
            .access_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }

    fn persist(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(session)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write credential file {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, CredentialStore) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let store = CredentialStore::open(dir.path());
        (dir, store)
    }

    #[test]
    fn test_set_and_get() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get(CredentialKind::Access), None);

        store.set(CredentialKind::Access, "A1").unwrap();
        store.set(CredentialKind::Refresh, "R1").unwrap();
        assert_eq!(store.get(CredentialKind::Access).as_deref(), Some("A1"));
        assert_eq!(store.get(CredentialKind::Refresh).as_deref(), Some("R1"));

        // Replacement overwrites, it does not accumulate
        store.set(CredentialKind::Access, "A2").unwrap();
        assert_eq!(store.get(CredentialKind::Access).as_deref(), Some("A2"));
        assert_eq!(store.get(CredentialKind::Refresh).as_deref(), Some("R1"));
    }

    #[test]
    fn test_is_authenticated_requires_nonempty_access() {
        let (_dir, store) = temp_store();
        assert!(!store.is_authenticated());

        // Refresh alone does not authenticate
        store.set(CredentialKind::Refresh, "R1").unwrap();
        assert!(!store.is_authenticated());

        // Empty access does not authenticate
        store.set(CredentialKind::Access, "").unwrap();
        assert!(!store.is_authenticated());

        store.set(CredentialKind::Access, "A1").unwrap();
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (_dir, store) = temp_store();
        store.set(CredentialKind::Access, "A1").unwrap();
        store.set(CredentialKind::Refresh, "R1").unwrap();

        store.clear().unwrap();
        assert_eq!(store.get(CredentialKind::Access), None);
        assert_eq!(store.get(CredentialKind::Refresh), None);
        assert!(!store.is_authenticated());

        // Clearing an already-empty store is fine
        store.clear().unwrap();
        assert_eq!(store.get(CredentialKind::Access), None);
        assert_eq!(store.get(CredentialKind::Refresh), None);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = CredentialStore::open(dir.path());
            store.set(CredentialKind::Access, "A1").unwrap();
            store.set(CredentialKind::Refresh, "R1").unwrap();
        }
        let store = CredentialStore::open(dir.path());
        assert_eq!(store.get(CredentialKind::Access).as_deref(), Some("A1"));
        assert_eq!(store.get(CredentialKind::Refresh).as_deref(), Some("R1"));
        assert!(store.is_authenticated());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CREDENTIALS_FILE), "not json{").unwrap();

        let store = CredentialStore::open(dir.path());
        assert_eq!(store.get(CredentialKind::Access), None);
        assert!(!store.is_authenticated());
    }
}
