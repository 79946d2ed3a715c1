use async_trait::async_trait;
use hitl_contract::storage::{SessionStore, SessionStoreError};
use hitl_contract::{Session, SessionKey};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::time::Instant;

struct SessionEntry {
    /// Record as JSON, the shape a durable backend would hold.
    record: serde_json::Value,
    expires_at: Instant,
    /// Write sequence; the highest live one per user is the active session.
    seq: u64,
}

impl SessionEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

#[derive(Default)]
struct Inner {
    records: HashMap<SessionKey, SessionEntry>,
    /// User registry and per-user index. Users stay registered after their sets empty.
    users: BTreeMap<String, BTreeSet<String>>,
    next_seq: u64,
}

impl Inner {
    fn put(&mut self, session: &Session) -> Result<(), SessionStoreError> {
        let record = serde_json::to_value(session)?;
        self.next_seq += 1;
        let key = session.key();
        self.users
            .entry(key.user_id.clone())
            .or_default()
            .insert(key.session_id.clone());
        self.records.insert(
            key,
            SessionEntry {
                record,
                expires_at: Instant::now() + session.ttl,
                seq: self.next_seq,
            },
        );
        Ok(())
    }

    fn live(&self, key: &SessionKey, now: Instant) -> Option<&SessionEntry> {
        self.records.get(key).filter(|entry| entry.is_live(now))
    }

    fn live_ids(&self, user_id: &str, now: Instant) -> BTreeSet<String> {
        let Some(ids) = self.users.get(user_id) else {
            return BTreeSet::new();
        };
        ids.iter()
            .filter(|id| self.live(&SessionKey::new(user_id, id.as_str()), now).is_some())
            .cloned()
            .collect()
    }

    fn remove(&mut self, key: &SessionKey) -> bool {
        let removed = self.records.remove(key).is_some();
        if let Some(ids) = self.users.get_mut(&key.user_id) {
            ids.remove(&key.session_id);
        }
        removed
    }
}

/// In-memory TTL session store.
///
/// Every write re-arms the record's expiry from its `ttl`. Expiry is measured
/// on the tokio clock, so paused-time tests can drive it.
#[derive(Default)]
pub struct MemoryStore {
    inner: tokio::sync::RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, session: &Session) -> Result<(), SessionStoreError> {
        let mut inner = self.inner.write().await;
        let key = session.key();
        let now = Instant::now();
        if inner.live(&key, now).is_some() {
            return Err(SessionStoreError::AlreadyExists);
        }
        inner.remove(&key);
        inner.put(session)
    }

    async fn update(&self, session: &Session) -> Result<(), SessionStoreError> {
        let mut inner = self.inner.write().await;
        inner.put(session)
    }

    async fn get(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Session>, SessionStoreError> {
        let inner = self.inner.read().await;
        inner
            .live(&SessionKey::new(user_id, session_id), Instant::now())
            .map(|entry| serde_json::from_value(entry.record.clone()).map_err(Into::into))
            .transpose()
    }

    async fn delete(&self, user_id: &str, session_id: &str) -> Result<(), SessionStoreError> {
        let mut inner = self.inner.write().await;
        inner.remove(&SessionKey::new(user_id, session_id));
        Ok(())
    }

    async fn user_exists(&self, user_id: &str) -> Result<bool, SessionStoreError> {
        Ok(self.inner.read().await.users.contains_key(user_id))
    }

    async fn all_session_ids(
        &self,
        user_id: &str,
    ) -> Result<BTreeSet<String>, SessionStoreError> {
        let inner = self.inner.read().await;
        Ok(inner.live_ids(user_id, Instant::now()))
    }

    async fn active_session_id(&self, user_id: &str) -> Result<Option<String>, SessionStoreError> {
        let inner = self.inner.read().await;
        let now = Instant::now();
        let Some(ids) = inner.users.get(user_id) else {
            return Ok(None);
        };
        Ok(ids
            .iter()
            .filter_map(|id| {
                inner
                    .live(&SessionKey::new(user_id, id.as_str()), now)
                    .map(|entry| (entry.seq, id))
            })
            .max_by_key(|(seq, _)| *seq)
            .map(|(_, id)| id.clone()))
    }

    async fn session_count(&self) -> Result<usize, SessionStoreError> {
        let inner = self.inner.read().await;
        let now = Instant::now();
        Ok(inner.records.values().filter(|e| e.is_live(now)).count())
    }

    async fn all_users_and_sessions(
        &self,
    ) -> Result<BTreeMap<String, BTreeSet<String>>, SessionStoreError> {
        let inner = self.inner.read().await;
        let now = Instant::now();
        Ok(inner
            .users
            .keys()
            .map(|user_id| (user_id.clone(), inner.live_ids(user_id, now)))
            .collect())
    }

    async fn purge_expired(&self) -> Result<usize, SessionStoreError> {
        let mut inner = self.inner.write().await;
        let now = Instant::now();
        let expired: Vec<SessionKey> = inner
            .records
            .iter()
            .filter(|(_, entry)| !entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            inner.remove(key);
        }
        if !expired.is_empty() {
            tracing::debug!(removed = expired.len(), "purged expired sessions");
        }
        Ok(expired.len())
    }
}
