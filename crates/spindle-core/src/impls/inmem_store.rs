//! InMemoryStore - 開発・テスト用の key-value ストア

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::ports::{KvStore, StoreError};

/// InMemoryStore は HashMap をそのままストアとして扱う
///
/// # 使用例
/// ```ignore
/// let store = InMemoryStore::new();
/// store.set("metrics", r#"{"cpu0": 12.5}"#).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    cells: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete a cell, as an external producer might.
    pub async fn remove(&self, key: &str) -> Option<String> {
        self.cells.lock().await.remove(key)
    }
}

#[async_trait]
impl KvStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.cells.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.cells
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
