//! In-memory SessionRepository implementation.
//!
//! Used by tests and single-process deployments that do not need sessions
//! to survive a restart. Enforces the same optimistic versioning contract
//! as the file-backed repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use deckflow_core::session::{Session, SessionRepository};
use deckflow_core::{DeckflowError, Result};

/// Sessions in a process-local map.
#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn upsert(&self, session: &Session) -> Result<u64> {
        let mut sessions = self.sessions.write().await;
        let stored_version = sessions.get(&session.id).map(|s| s.version);
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
        let version = stored.version;
        sessions.insert(session.id.clone(), stored);
        Ok(version)
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        let sessions = self.sessions.read().await;
        let mut all: Vec<Session> = sessions.values().cloned().collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(all)
    }
}
