use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::errors::ConfigError;

/// How far CNAME answers are expanded into terminal address records.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FlatteningPolicy {
    /// Answer with the CNAME only.
    None,

    /// Chase aliases that point into a configured zone.
    #[default]
    Local,

    /// Chase in-zone aliases locally and everything else through the next handler.
    Full,
}

impl FlatteningPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Local => "local",
            Self::Full => "full",
        }
    }
}

impl FromStr for FlatteningPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "local" => Ok(Self::Local),
            "full" => Ok(Self::Full),
            _ => Err(ConfigError::Validation(format!(
                "Invalid flattening policy '{}'",
                s
            ))),
        }
    }
}

impl fmt::Display for FlatteningPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read options passed with every zone document fetch.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct KvCacheOptions {
    #[serde(default = "default_true")]
    pub use_cache: bool,

    /// Seconds a cached answer may be served for.
    #[serde(default = "default_max_age")]
    pub max_age: u64,

    #[serde(default)]
    pub consistent: bool,

    #[serde(default = "default_true")]
    pub allow_stale: bool,
}

impl KvCacheOptions {
    pub fn max_age_duration(&self) -> Duration {
        Duration::from_secs(self.max_age)
    }
}

impl Default for KvCacheOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            max_age: default_max_age(),
            consistent: false,
            allow_stale: true,
        }
    }
}

/// The hot-reloadable part of the configuration. Requests read one snapshot of
/// it and never observe a partially applied update.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, Default)]
pub struct ZoneSettings {
    /// Key prefix for zone documents. Empty means "same as the KV prefix".
    #[serde(default, alias = "zone_prefix")]
    pub prefix: String,

    /// Ordered, first match wins.
    #[serde(default)]
    pub zones: Vec<String>,

    #[serde(default)]
    pub flattening: FlatteningPolicy,

    #[serde(default)]
    pub fallthrough: bool,

    #[serde(default, alias = "consul_cache")]
    pub cache: KvCacheOptions,
}

impl ZoneSettings {
    /// Overlays a JSON settings document (the `<prefix>/config` KV entry) on top
    /// of `self`. Fields absent from the document keep their current value.
    pub fn apply_document(&self, bytes: &[u8]) -> Result<ZoneSettings, ConfigError> {
        let patch: ZoneSettingsPatch =
            serde_json::from_slice(bytes).map_err(|e| ConfigError::Document(e.to_string()))?;

        let mut settings = self.clone();
        if let Some(prefix) = patch.prefix {
            settings.prefix = prefix;
        }
        if let Some(zones) = patch.zones {
            settings.zones = zones;
        }
        if let Some(flattening) = patch.flattening {
            settings.flattening = flattening;
        }
        if let Some(fallthrough) = patch.fallthrough {
            settings.fallthrough = fallthrough;
        }
        if let Some(cache) = patch.cache {
            if let Some(use_cache) = cache.use_cache {
                settings.cache.use_cache = use_cache;
            }
            if let Some(max_age) = cache.max_age {
                settings.cache.max_age = max_age;
            }
            if let Some(consistent) = cache.consistent {
                settings.cache.consistent = consistent;
            }
            if let Some(allow_stale) = cache.allow_stale {
                settings.cache.allow_stale = allow_stale;
            }
        }
        if patch.no_cache == Some(true) {
            settings.cache.use_cache = false;
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() {
            return Err(ConfigError::Validation(
                "Zone prefix cannot be empty".to_string(),
            ));
        }

        if let Some(pos) = self.zones.iter().position(|z| z.trim_end_matches('.').is_empty()) {
            return Err(ConfigError::Validation(format!(
                "Zone entry {} is empty",
                pos
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ZoneSettingsPatch {
    #[serde(default, alias = "zone_prefix")]
    prefix: Option<String>,

    #[serde(default)]
    zones: Option<Vec<String>>,

    #[serde(default)]
    flattening: Option<FlatteningPolicy>,

    #[serde(default)]
    fallthrough: Option<bool>,

    #[serde(default)]
    no_cache: Option<bool>,

    #[serde(default, alias = "consul_cache")]
    cache: Option<KvCachePatch>,
}

#[derive(Debug, Deserialize)]
struct KvCachePatch {
    #[serde(default)]
    use_cache: Option<bool>,

    #[serde(default)]
    max_age: Option<u64>,

    #[serde(default)]
    consistent: Option<bool>,

    #[serde(default)]
    allow_stale: Option<bool>,
}

fn default_true() -> bool {
    true
}

fn default_max_age() -> u64 {
    60
}
