// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session persistence: key/value storage backends and the observer that
//! mirrors the store into them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::session::store::{SessionChange, SessionObserver};
use crate::session::{AuthSession, Credential, Identity};

/// Storage key holding the serialized session.
pub const SESSION_KEY: &str = "auth-storage";

/// Durable key -> string storage that survives restarts.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// Persisted form of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    pub identity: Identity,
    pub credential: Credential,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_at_ms: Option<u64>,
}

impl PersistedSession {
    pub fn new(session: &AuthSession, last_activity_ms: u64) -> Self {
        Self {
            identity: session.identity.clone(),
            credential: session.credential.clone(),
            last_activity_at_ms: Some(last_activity_ms),
        }
    }
}

/// Load the persisted session, if any.
///
/// Corrupt entries are logged and removed so they are not retried on every
/// start.
pub fn load_session(storage: &dyn Storage) -> Option<PersistedSession> {
    let raw = match storage.get(SESSION_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(err = %e, "failed to read persisted session");
            return None;
        }
    };
    match serde_json::from_str::<PersistedSession>(&raw) {
        Ok(session) => Some(session),
        Err(e) => {
            tracing::warn!(err = %e, "discarding corrupt persisted session");
            if let Err(e) = storage.remove(SESSION_KEY) {
                tracing::warn!(err = %e, "failed to remove corrupt persisted session");
            }
            None
        }
    }
}

/// Mirrors store changes into a [`Storage`] backend.
pub struct StorageObserver<S> {
    storage: S,
}

impl<S: Storage> StorageObserver<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: Storage> SessionObserver for StorageObserver<S> {
    fn session_changed(&self, change: &SessionChange<'_>) {
        let result = match change {
            SessionChange::Stored { session, last_activity_ms } => {
                serde_json::to_string(&PersistedSession::new(session, *last_activity_ms))
                    .map_err(anyhow::Error::from)
                    .and_then(|json| self.storage.set(SESSION_KEY, &json))
            }
            SessionChange::Cleared => self.storage.remove(SESSION_KEY),
        };
        if let Err(e) = result {
            tracing::warn!(err = %e, "failed to persist session");
        }
    }
}

impl<S: Storage + ?Sized> Storage for std::sync::Arc<S> {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        (**self).remove(key)
    }
}

/// In-process storage. Survives store re-creation, not process exit.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.entries.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a state directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write atomically (write tmp + rename).
    ///
    /// Uses a unique temp filename (PID + counter) so concurrent writers never
    /// share a `.tmp` file.
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        std::fs::create_dir_all(&self.dir)?;
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_path = self.dir.join(format!("{key}.json.{}.{seq}.tmp", std::process::id()));
        std::fs::write(&tmp_path, value)?;
        std::fs::rename(&tmp_path, self.path(key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> anyhow::Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Resolve the state directory for persisted sessions.
///
/// Checks `WARDEN_STATE_DIR`, then `$XDG_STATE_HOME/warden`,
/// then `$HOME/.local/state/warden`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("WARDEN_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("warden");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/warden");
    }
    PathBuf::from(".warden")
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
