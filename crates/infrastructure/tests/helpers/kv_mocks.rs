use async_trait::async_trait;
use kvdns_application::ports::{KvStore, KvWatch, KvWatchEvent};
use kvdns_domain::{DomainError, KvCacheOptions};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Default)]
pub struct MemoryKvStore {
    documents: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: &str, document: &str) {
        self.documents
            .lock()
            .unwrap()
            .insert(key.to_string(), document.as_bytes().to_vec());
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(
        &self,
        key: &str,
        _options: &KvCacheOptions,
    ) -> Result<Option<Vec<u8>>, DomainError> {
        Ok(self.documents.lock().unwrap().get(key).cloned())
    }
}

/// Replays queued watch results, then blocks for the requested wait like an
/// idle blocking query.
#[derive(Clone, Default)]
pub struct ScriptedKvWatch {
    events: Arc<Mutex<VecDeque<Result<KvWatchEvent, DomainError>>>>,
    calls: Arc<Mutex<Vec<u64>>>,
}

impl ScriptedKvWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, index: u64, value: Option<&str>) {
        self.events.lock().unwrap().push_back(Ok(KvWatchEvent {
            index,
            value: value.map(|v| v.as_bytes().to_vec()),
        }));
    }

    pub fn push_error(&self, error: DomainError) {
        self.events.lock().unwrap().push_back(Err(error));
    }

    /// Index passed to each `watch` call.
    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl KvWatch for ScriptedKvWatch {
    async fn watch(
        &self,
        _key: &str,
        index: u64,
        wait: Duration,
    ) -> Result<KvWatchEvent, DomainError> {
        self.calls.lock().unwrap().push(index);

        let next = self.events.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => {
                tokio::time::sleep(wait).await;
                Ok(KvWatchEvent { index, value: None })
            }
        }
    }
}
