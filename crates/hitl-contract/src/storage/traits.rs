use crate::runtime::Checkpoint;
use crate::session::{Session, SessionKey};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};

use super::{CheckpointStoreError, PreferenceStoreError, SessionStoreError};

/// TTL-bounded session record store with per-user indices.
///
/// Expired records are invisible to every read.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn exists(&self, user_id: &str, session_id: &str) -> Result<bool, SessionStoreError> {
        Ok(self.get(user_id, session_id).await?.is_some())
    }

    /// Insert a new record. Never overwrites a live record.
    ///
    /// Returns [`SessionStoreError::AlreadyExists`] if one is present.
    async fn create(&self, session: &Session) -> Result<(), SessionStoreError>;

    /// Replace the record and re-arm its TTL.
    async fn update(&self, session: &Session) -> Result<(), SessionStoreError>;

    async fn get(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>, SessionStoreError>;

    /// Delete a record. Deleting a missing record is not an error.
    async fn delete(&self, user_id: &str, session_id: &str) -> Result<(), SessionStoreError>;

    /// Whether the user was ever registered, even if all sessions are gone.
    async fn user_exists(&self, user_id: &str) -> Result<bool, SessionStoreError>;

    /// Live session ids of the user; empty for an unknown user.
    async fn all_session_ids(&self, user_id: &str)
        -> Result<BTreeSet<String>, SessionStoreError>;

    /// Most recently written live session of the user.
    async fn active_session_id(&self, user_id: &str) -> Result<Option<String>, SessionStoreError>;

    /// Number of live records.
    async fn session_count(&self) -> Result<usize, SessionStoreError>;

    /// Every registered user with their live session ids.
    async fn all_users_and_sessions(
        &self,
    ) -> Result<BTreeMap<String, BTreeSet<String>>, SessionStoreError>;

    /// Drop expired records and prune the indices. Returns the number removed.
    async fn purge_expired(&self) -> Result<usize, SessionStoreError>;
}

/// Long-term per-user preference entries.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Append an entry; returns its id.
    async fn write(&self, user_id: &str, info: &str) -> Result<String, PreferenceStoreError>;

    /// Entries in write order.
    async fn read(&self, user_id: &str) -> Result<Vec<String>, PreferenceStoreError>;
}

/// Engine replay state keyed by `(user_id, session_id)`.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn load(&self, key: &SessionKey) -> Result<Option<Checkpoint>, CheckpointStoreError>;

    async fn save(&self, key: &SessionKey, checkpoint: &Checkpoint)
        -> Result<(), CheckpointStoreError>;

    async fn delete(&self, key: &SessionKey) -> Result<(), CheckpointStoreError>;
}
