//! Session cookie persistence
//!
//! The CLI runs one command per process, so the API session cookies are
//! written to a JSON file between runs and loaded back into the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Session store errors
#[derive(Debug, Error)]
pub enum SessionStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt session file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No data directory available on this platform")]
    NoDataDir,
}

/// Contents of the session file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub cookies: BTreeMap<String, String>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// JSON file holding the session cookies
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store in the platform data directory
    pub fn default_location() -> Result<Self, SessionStoreError> {
        let dir = dirs::data_local_dir().ok_or(SessionStoreError::NoDataDir)?;
        Ok(Self::new(dir.join("moodgarden").join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session; a missing file is an empty session
    pub fn load(&self) -> Result<StoredSession, SessionStoreError> {
        if !self.path.exists() {
            return Ok(StoredSession::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let session: StoredSession = serde_json::from_str(&content)?;
        tracing::debug!(path = ?self.path, cookies = session.cookies.len(), "Loaded session");
        Ok(session)
    }

    pub fn save(&self, cookies: &BTreeMap<String, String>) -> Result<(), SessionStoreError> {
        if cookies.is_empty() {
            return self.clear();
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let session = StoredSession {
            cookies: cookies.clone(),
            saved_at: Some(Utc::now()),
        };
        let content = serde_json::to_string_pretty(&session)?;
        std::fs::write(&self.path, content)?;

        tracing::debug!(path = ?self.path, cookies = cookies.len(), "Saved session");
        Ok(())
    }

    /// Remove the session file if present
    pub fn clear(&self) -> Result<(), SessionStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
