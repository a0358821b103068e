//! Consul KV over the HTTP API.

use async_trait::async_trait;
use kvdns_application::ports::{KvStore, KvWatch, KvWatchEvent};
use kvdns_domain::{DomainError, KvCacheOptions, KvConfig};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::debug;

const TOKEN_HEADER: &str = "X-Consul-Token";
const INDEX_HEADER: &str = "X-Consul-Index";

/// Seconds a cached entry may still be served when the agent cannot reach
/// the servers.
const STALE_IF_ERROR_SECS: u64 = 10;

/// Consul adds up to wait/16 of jitter to blocking queries.
const WATCH_GRACE: Duration = Duration::from_secs(5);

pub struct ConsulKvStore {
    client: reqwest::Client,
    address: String,
    token: Option<String>,
}

impl ConsulKvStore {
    pub fn new(config: &KvConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_millis(config.request_timeout))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| {
                DomainError::StoreUnavailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            address: normalize_address(&config.address),
            token: config.token.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn get_request(&self, url: String) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        }
    }

    async fn send(&self, key: &str, request: RequestBuilder) -> Result<Response, DomainError> {
        request.send().await.map_err(|e| {
            DomainError::StoreUnavailable(format!("Request for '{}' failed: {}", key, e))
        })
    }

    async fn body(&self, key: &str, response: Response) -> Result<Vec<u8>, DomainError> {
        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::StoreUnavailable(format!(
                "Consul returned HTTP {} for '{}'",
                status.as_u16(),
                key
            )));
        }

        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| {
                DomainError::StoreUnavailable(format!("Failed to read value of '{}': {}", key, e))
            })
    }
}

#[async_trait]
impl KvStore for ConsulKvStore {
    async fn get(
        &self,
        key: &str,
        options: &KvCacheOptions,
    ) -> Result<Option<Vec<u8>>, DomainError> {
        let url = kv_url(&self.address, key, &read_params(options));
        let mut request = self.get_request(url);
        if let Some(cache_control) = cache_control(options) {
            request = request.header(reqwest::header::CACHE_CONTROL, cache_control);
        }

        let response = self.send(key, request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(key = %key, "Key not found in Consul");
            return Ok(None);
        }

        self.body(key, response).await.map(Some)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let url = format!("{}/v1/status/leader", self.address);
        let response = self.send("status/leader", self.get_request(url)).await?;
        let leader = self.body("status/leader", response).await?;

        let leader: String = serde_json::from_slice(&leader).map_err(|e| {
            DomainError::StoreUnavailable(format!("Unexpected leader response: {}", e))
        })?;

        // an empty leader means the cluster has no quorum
        if leader.is_empty() {
            return Err(DomainError::StoreUnavailable(
                "Consul cluster has no leader".to_string(),
            ));
        }
        debug!(leader = %leader, "Consul leader reachable");
        Ok(())
    }
}

#[async_trait]
impl KvWatch for ConsulKvStore {
    async fn watch(
        &self,
        key: &str,
        index: u64,
        wait: Duration,
    ) -> Result<KvWatchEvent, DomainError> {
        let mut params = vec!["raw".to_string()];
        if index > 0 {
            params.push(format!("index={}", index));
            params.push(format!("wait={}s", wait.as_secs().max(1)));
        }

        let url = kv_url(&self.address, key, &params);
        let request = self
            .get_request(url)
            .timeout(wait + wait / 16 + WATCH_GRACE);
        let response = self.send(key, request).await?;

        let new_index = response
            .headers()
            .get(INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(index);

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(KvWatchEvent {
                index: new_index,
                value: None,
            });
        }

        let value = self.body(key, response).await?;
        Ok(KvWatchEvent {
            index: new_index,
            value: Some(value),
        })
    }
}

fn normalize_address(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    }
}

fn kv_url(address: &str, key: &str, params: &[String]) -> String {
    let mut url = format!("{}/v1/kv/{}", address, key.trim_start_matches('/'));
    for (i, param) in params.iter().enumerate() {
        url.push(if i == 0 { '?' } else { '&' });
        url.push_str(param);
    }
    url
}

/// Consistency and agent-cache query parameters. `consistent` wins over
/// `stale` when both are set.
fn read_params(options: &KvCacheOptions) -> Vec<String> {
    let mut params = vec!["raw".to_string()];
    if options.consistent {
        params.push("consistent".to_string());
    } else if options.allow_stale {
        params.push("stale".to_string());
    }
    if options.use_cache {
        params.push("cached".to_string());
    }
    params
}

fn cache_control(options: &KvCacheOptions) -> Option<String> {
    options.use_cache.then(|| {
        format!(
            "max-age={}, stale-if-error={}",
            options.max_age, STALE_IF_ERROR_SECS
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_read_params() {
        let params = read_params(&KvCacheOptions::default());
        assert_eq!(params, vec!["raw", "stale", "cached"]);
        assert_eq!(
            cache_control(&KvCacheOptions::default()).as_deref(),
            Some("max-age=60, stale-if-error=10")
        );
    }

    #[test]
    fn test_consistent_read_without_cache() {
        let options = KvCacheOptions {
            use_cache: false,
            consistent: true,
            ..KvCacheOptions::default()
        };

        assert_eq!(read_params(&options), vec!["raw", "consistent"]);
        assert!(cache_control(&options).is_none());
    }

    #[test]
    fn test_kv_url() {
        let url = kv_url(
            "http://127.0.0.1:8500",
            "dns/example.com/@",
            &["raw".to_string(), "stale".to_string()],
        );
        assert_eq!(url, "http://127.0.0.1:8500/v1/kv/dns/example.com/@?raw&stale");
    }

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address("consul:8500"), "http://consul:8500");
        assert_eq!(
            normalize_address("https://consul.internal/"),
            "https://consul.internal"
        );
    }
}
