use serde::{Deserialize, Serialize};

pub const DEFAULT_KV_ADDRESS: &str = "http://127.0.0.1:8500";
pub const DEFAULT_KV_PREFIX: &str = "dns";

/// Connection to the Consul KV store.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KvConfig {
    #[serde(default = "default_address")]
    pub address: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Key prefix under which `config` lives. Zone documents use the zone
    /// settings prefix, which defaults to this one.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Disable live reload of `<prefix>/config`.
    #[serde(default)]
    pub disable_watch: bool,

    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Blocking query wait in seconds used by the config watcher.
    #[serde(default = "default_watch_wait")]
    pub watch_wait: u64,
}

impl KvConfig {
    pub fn config_key(&self) -> String {
        format!("{}/config", self.prefix)
    }
}

impl Default for KvConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            token: None,
            prefix: default_prefix(),
            disable_watch: false,
            request_timeout: default_request_timeout(),
            watch_wait: default_watch_wait(),
        }
    }
}

fn default_address() -> String {
    DEFAULT_KV_ADDRESS.to_string()
}

fn default_prefix() -> String {
    DEFAULT_KV_PREFIX.to_string()
}

fn default_request_timeout() -> u64 {
    3000
}

fn default_watch_wait() -> u64 {
    300
}
