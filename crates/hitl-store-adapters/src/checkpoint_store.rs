use async_trait::async_trait;
use hitl_contract::storage::{CheckpointStore, CheckpointStoreError};
use hitl_contract::{Checkpoint, SessionKey};
use std::collections::HashMap;

/// In-memory engine checkpoint store.
///
/// Checkpoints are stored as JSON so a checkpoint that cannot round-trip
/// fails here rather than in a durable backend.
#[derive(Default)]
pub struct MemoryCheckpointStore {
    entries: tokio::sync::RwLock<HashMap<SessionKey, serde_json::Value>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self, key: &SessionKey) -> Result<Option<Checkpoint>, CheckpointStoreError> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .map(|value| serde_json::from_value(value.clone()).map_err(Into::into))
            .transpose()
    }

    async fn save(
        &self,
        key: &SessionKey,
        checkpoint: &Checkpoint,
    ) -> Result<(), CheckpointStoreError> {
        let value = serde_json::to_value(checkpoint)?;
        self.entries.write().await.insert(key.clone(), value);
        Ok(())
    }

    async fn delete(&self, key: &SessionKey) -> Result<(), CheckpointStoreError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
