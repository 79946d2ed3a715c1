use async_trait::async_trait;
use hitl_contract::storage::{PreferenceStore, PreferenceStoreError};
use std::collections::HashMap;

/// In-memory long-term preference store, entries kept in write order.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    entries: tokio::sync::RwLock<HashMap<String, Vec<(String, String)>>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn write(&self, user_id: &str, info: &str) -> Result<String, PreferenceStoreError> {
        let memory_id = uuid::Uuid::new_v4().to_string();
        self.entries
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push((memory_id.clone(), info.to_string()));
        Ok(memory_id)
    }

    async fn read(&self, user_id: &str) -> Result<Vec<String>, PreferenceStoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(user_id)
            .map(|items| items.iter().map(|(_, info)| info.clone()).collect())
            .unwrap_or_default())
    }
}
