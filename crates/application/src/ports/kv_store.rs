use async_trait::async_trait;
use kvdns_domain::{DomainError, KvCacheOptions};
use std::time::Duration;

/// Read access to the key/value store holding zone documents.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Raw bytes stored at `key`, or `None` when the key does not exist.
    async fn get(
        &self,
        key: &str,
        options: &KvCacheOptions,
    ) -> Result<Option<Vec<u8>>, DomainError>;

    /// Reachability check used for readiness.
    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Value of a key as observed by a blocking read, with the store index it was
/// read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KvWatchEvent {
    pub index: u64,
    pub value: Option<Vec<u8>>,
}

/// Change notification for a single key.
#[async_trait]
pub trait KvWatch: Send + Sync {
    /// Returns once the key has changed past `index`, or when `wait` elapses
    /// with the index unchanged. An `index` of 0 returns the current value
    /// immediately.
    async fn watch(
        &self,
        key: &str,
        index: u64,
        wait: Duration,
    ) -> Result<KvWatchEvent, DomainError>;
}
