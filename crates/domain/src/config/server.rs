use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub dns_port: u16,

    pub bind_address: String,

    #[serde(default = "default_true")]
    pub tcp_enabled: bool,

    /// Upper bound for answering one query, KV fetches and next handler included.
    #[serde(default = "default_query_timeout")]
    pub query_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            dns_port: 53,
            bind_address: "0.0.0.0".to_string(),
            tcp_enabled: true,
            query_timeout: default_query_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_query_timeout() -> u64 {
    5000
}
