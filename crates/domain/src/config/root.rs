use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use super::kv::KvConfig;
use super::logging::LoggingConfig;
use super::server::ServerConfig;
use super::upstream::UpstreamConfig;
use super::zone_settings::ZoneSettings;

pub const ENV_KV_ADDRESS: &str = "CONSUL_HTTP_ADDR";
pub const ENV_KV_TOKEN: &str = "CONSUL_HTTP_TOKEN";
pub const ENV_KV_PREFIX: &str = "CONSUL_KV_PREFIX";

/// Main configuration structure for kvdns
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Listener configuration (port, bind address)
    #[serde(default)]
    pub server: ServerConfig,

    /// Consul KV connection
    #[serde(default)]
    pub kv: KvConfig,

    /// Zones and resolution behaviour, hot-reloadable from the KV store
    #[serde(default)]
    pub zone: ZoneSettings,

    /// Next handler for names outside the configured zones
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file or use defaults
    ///
    /// Priority order:
    /// 1. Explicitly provided path
    /// 2. kvdns.toml in current directory
    /// 3. /etc/kvdns/config.toml
    /// 4. Default configuration
    ///
    /// Environment variables are applied on top of the file, and command-line
    /// overrides on top of both.
    pub fn load(path: Option<&str>, cli_overrides: CliOverrides) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = path {
            Self::from_file(path)?
        } else if let Some(path) = Self::get_config_path() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides_from(|key| std::env::var(key).ok());
        config.apply_cli_overrides(cli_overrides);
        config.normalize_zone_prefix();
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;
        Self::from_toml(&contents)
    }

    /// Applies `CONSUL_HTTP_ADDR`, `CONSUL_HTTP_TOKEN` and `CONSUL_KV_PREFIX`.
    /// Empty values are ignored.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(address) = lookup(ENV_KV_ADDRESS) {
            self.kv.address = address;
        }
        if let Some(token) = lookup(ENV_KV_TOKEN) {
            self.kv.token = Some(token);
        }
        if let Some(prefix) = lookup(ENV_KV_PREFIX) {
            self.kv.prefix = prefix;
        }
    }

    pub fn apply_cli_overrides(&mut self, overrides: CliOverrides) {
        if let Some(port) = overrides.dns_port {
            self.server.dns_port = port;
        }
        if let Some(bind) = overrides.bind_address {
            self.server.bind_address = bind;
        }
        if let Some(address) = overrides.kv_address {
            self.kv.address = address;
        }
        if let Some(token) = overrides.kv_token {
            self.kv.token = Some(token);
        }
        if let Some(prefix) = overrides.kv_prefix {
            self.kv.prefix = prefix;
        }
        if let Some(zones) = overrides.zones {
            self.zone.zones = zones;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Zone documents live under the KV prefix unless a zone prefix is set.
    pub fn normalize_zone_prefix(&mut self) {
        if self.zone.prefix.is_empty() {
            self.zone.prefix = self.kv.prefix.clone();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.dns_port == 0 {
            return Err(ConfigError::Validation("DNS port cannot be 0".to_string()));
        }

        if self.kv.prefix.is_empty() {
            return Err(ConfigError::Validation(
                "KV prefix cannot be empty".to_string(),
            ));
        }

        self.zone.validate()?;
        self.upstream.socket_addrs()?;

        Ok(())
    }

    pub fn save(&self, path: &str) -> Result<(), ConfigError> {
        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, toml_string)
            .map_err(|e| ConfigError::FileWrite(path.to_string(), e.to_string()))?;
        Ok(())
    }

    /// Get the path to the configuration file being used
    pub fn get_config_path() -> Option<String> {
        if std::path::Path::new("kvdns.toml").exists() {
            Some("kvdns.toml".to_string())
        } else if std::path::Path::new("/etc/kvdns/config.toml").exists() {
            Some("/etc/kvdns/config.toml".to_string())
        } else {
            None
        }
    }
}

/// Command-line overrides for configuration
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub dns_port: Option<u16>,
    pub bind_address: Option<String>,
    pub kv_address: Option<String>,
    pub kv_token: Option<String>,
    pub kv_prefix: Option<String>,
    pub zones: Option<Vec<String>>,
    pub log_level: Option<String>,
}
