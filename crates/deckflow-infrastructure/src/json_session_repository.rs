//! File-based SessionRepository implementation.
//!
//! Stores each session as one JSON document under a sessions directory.
//! The documents are JSON rather than TOML because generated content bodies
//! are arbitrary backend payloads, and values like `null` have no TOML
//! representation. Writes are atomic and guarded by an advisory file lock,
//! so the optimistic version check holds across processes.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use deckflow_core::session::{Session, SessionRepository};
use deckflow_core::{DeckflowError, Result};

use crate::storage::{FileLock, write_atomic};

/// A repository storing sessions as individual JSON files.
///
/// Directory structure:
/// ```text
/// base_dir/
/// └── sessions/
///     ├── session-id-1.json
///     └── session-id-2.json
/// ```
pub struct JsonSessionRepository {
    base_dir: PathBuf,
}

impl JsonSessionRepository {
    /// Creates a repository rooted at `base_dir`.
    ///
    /// The sessions directory is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory structure cannot be created.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(base_dir.join("sessions"))?;
        Ok(Self { base_dir })
    }

    fn session_file_path(&self, session_id: &str) -> PathBuf {
        self.base_dir
            .join("sessions")
            .join(format!("{}.json", session_id))
    }

    /// Session ids come from outside and become file names, so anything
    /// that could escape the sessions directory is rejected.
    fn validate_session_id(session_id: &str) -> Result<()> {
        if session_id.is_empty()
            || session_id.contains('/')
            || session_id.contains('\\')
            || session_id.contains("..")
        {
            return Err(DeckflowError::configuration(format!(
                "invalid session id '{}'",
                session_id
            )));
        }
        Ok(())
    }

    fn load_session_from_path(&self, path: &Path) -> Result<Session> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait]
impl SessionRepository for JsonSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        Self::validate_session_id(session_id)?;
        let path = self.session_file_path(session_id);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    async fn upsert(&self, session: &Session) -> Result<u64> {
        Self::validate_session_id(&session.id)?;
        let path = self.session_file_path(&session.id);

        // The lock covers the read-compare-write sequence; without it two
        // processes could both pass the version check.
        let _lock = FileLock::acquire(&path)?;

        let stored_version = if path.exists() {
            Some(self.load_session_from_path(&path)?.version)
        } else {
            None
        };
        let matches = match stored_version {
            None => session.version == 0,
            Some(found) => found == session.version,
        };
        if !matches {
            return Err(DeckflowError::store_conflict(
                session.id.clone(),
                session.version,
                stored_version.unwrap_or(0),
            ));
        }

        let mut stored = session.clone();
        stored.version += 1;
        let rendered = serde_json::to_string_pretty(&stored)?;
        write_atomic(&path, &rendered)?;
        Ok(stored.version)
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        Self::validate_session_id(session_id)?;
        let path = self.session_file_path(session_id);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        let sessions_dir = self.base_dir.join("sessions");
        let mut sessions = Vec::new();

        for entry in fs::read_dir(&sessions_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match self.load_session_from_path(&path) {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    tracing::warn!(
                        target: "session_store",
                        "Skipping unreadable session file {:?}: {}",
                        path,
                        e
                    );
                }
            }
        }

        // Most recently updated first
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }
}
