//! Session repository trait.
//!
//! Defines the interface for session persistence operations.

use async_trait::async_trait;

use super::model::Session;
use crate::error::Result;

/// An abstract repository for managing session persistence.
///
/// This trait defines the contract for persisting and retrieving sessions,
/// decoupling the engine's core logic from the specific storage mechanism
/// (e.g., in-memory map, JSON files, database).
///
/// # Implementation Notes
///
/// Every write goes through [`SessionRepository::upsert`], which performs a
/// compare-and-swap on the session's version. Implementations must make the
/// check-and-write atomic with respect to other writers of the same store.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// # Arguments
    ///
    /// * `session_id` - The ID of the session to find
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    /// Writes a session, guarded by optimistic concurrency.
    ///
    /// The write succeeds only when `session.version` equals the stored
    /// version (or the session is new and carries version 0). The stored
    /// record is written with the version incremented by one.
    ///
    /// # Arguments
    ///
    /// * `session` - The session to write, carrying the version it was
    ///   loaded at
    ///
    /// # Returns
    ///
    /// - `Ok(version)`: The new stored version
    /// - `Err(DeckflowError::StoreConflict { .. })`: Another writer got
    ///   there first; reload and reapply
    /// - `Err(_)`: Error occurred during the write
    async fn upsert(&self, session: &Session) -> Result<u64>;

    /// Deletes a session from storage.
    ///
    /// # Arguments
    ///
    /// * `session_id` - The ID of the session to delete
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Session deleted successfully (or didn't exist)
    /// - `Err(_)`: Error occurred during deletion
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Lists all stored sessions.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Session>)`: All stored sessions
    /// - `Err(_)`: Error occurred during listing
    async fn list_all(&self) -> Result<Vec<Session>>;
}
