//! Storage collaborator interface
//!
//! The engine is an in-memory state machine; persistence belongs to a
//! collaborator behind [`SessionStore`]. A session and its modification log
//! are saved as a single unit per batch, which is where the storage layer's
//! own transactional guarantees take over.

use crate::log::ModificationLog;
use crate::session::{CookingSession, SessionId};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// A session together with its modification log, saved as one unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedSession {
    pub session: CookingSession,
    pub modifications: ModificationLog,
}

/// Trait for session storage backends
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Save a session and its log as one unit
    async fn save(&self, persisted: &PersistedSession) -> Result<()>;

    /// Load a session
    async fn load(&self, id: &SessionId) -> Result<Option<PersistedSession>>;

    /// List all stored session IDs
    async fn list(&self) -> Result<Vec<SessionId>>;

    /// Delete a session
    async fn delete(&self, id: &SessionId) -> Result<()>;
}

/// File-based session store (one JSON file per session)
pub struct FileSessionStore {
    base_path: PathBuf,
}

impl FileSessionStore {
    /// Create a store rooted at the given directory
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get path for a session
    fn session_path(&self, id: &SessionId) -> PathBuf {
        self.base_path.join(format!("{id}.json"))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, persisted: &PersistedSession) -> Result<()> {
        fs::create_dir_all(&self.base_path).await?;

        let json = serde_json::to_string_pretty(persisted)?;
        let path = self.session_path(&persisted.session.id);
        fs::write(&path, json).await?;

        Ok(())
    }

    async fn load(&self, id: &SessionId) -> Result<Option<PersistedSession>> {
        let path = self.session_path(id);

        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path).await?;
        let persisted = serde_json::from_str(&json)?;

        Ok(Some(persisted))
    }

    async fn list(&self) -> Result<Vec<SessionId>> {
        let mut sessions = Vec::new();

        if !self.base_path.exists() {
            return Ok(sessions);
        }

        let mut entries = fs::read_dir(&self.base_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    sessions.push(SessionId::from_string(stem.to_string()));
                }
            }
        }

        Ok(sessions)
    }

    async fn delete(&self, id: &SessionId) -> Result<()> {
        let path = self.session_path(id);

        if path.exists() {
            fs::remove_file(&path).await?;
        }

        Ok(())
    }
}

/// In-memory store for testing
#[cfg(test)]
pub struct InMemorySessionStore {
    sessions: std::sync::Mutex<std::collections::HashMap<SessionId, PersistedSession>>,
}

#[cfg(test)]
impl InMemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }
}

#[cfg(test)]
#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, persisted: &PersistedSession) -> Result<()> {
        self.sessions
            .lock()
            .unwrap()
            .insert(persisted.session.id.clone(), persisted.clone());
        Ok(())
    }

    async fn load(&self, id: &SessionId) -> Result<Option<PersistedSession>> {
        Ok(self.sessions.lock().unwrap().get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<SessionId>> {
        Ok(self.sessions.lock().unwrap().keys().cloned().collect())
    }

    async fn delete(&self, id: &SessionId) -> Result<()> {
        self.sessions.lock().unwrap().remove(id);
        Ok(())
    }
}
