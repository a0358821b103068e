use async_trait::async_trait;
use kvdns_application::ports::KvStore;
use kvdns_domain::{DomainError, KvCacheOptions};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory KV store keyed by the full KV path.
#[derive(Clone, Default)]
pub struct MockKvStore {
    documents: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    failing_keys: Arc<RwLock<HashSet<String>>>,
    requested: Arc<std::sync::Mutex<Vec<String>>>,
    unreachable: Arc<RwLock<bool>>,
}

impl MockKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, key: &str, document: &str) {
        self.documents
            .write()
            .await
            .insert(key.to_string(), document.as_bytes().to_vec());
    }

    pub async fn remove(&self, key: &str) {
        self.documents.write().await.remove(key);
    }

    pub async fn fail_key(&self, key: &str) {
        self.failing_keys.write().await.insert(key.to_string());
    }

    pub async fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.write().await = unreachable;
    }

    /// Keys passed to `get`, in call order.
    pub fn requested_keys(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl KvStore for MockKvStore {
    async fn get(
        &self,
        key: &str,
        _options: &KvCacheOptions,
    ) -> Result<Option<Vec<u8>>, DomainError> {
        self.requested.lock().unwrap().push(key.to_string());

        if *self.unreachable.read().await || self.failing_keys.read().await.contains(key) {
            return Err(DomainError::StoreUnavailable(format!(
                "mock failure for {}",
                key
            )));
        }

        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn ping(&self) -> Result<(), DomainError> {
        if *self.unreachable.read().await {
            return Err(DomainError::StoreUnavailable("mock unreachable".to_string()));
        }
        Ok(())
    }
}
