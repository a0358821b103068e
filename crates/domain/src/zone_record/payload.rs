use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SrvValue {
    pub target: String,
    pub port: u16,
    #[serde(default)]
    pub priority: u16,
    #[serde(default)]
    pub weight: u16,
}

/// One SVCB or HTTPS entry. `params` maps presentation keys (`alpn`, `port`,
/// `ipv4hint`, `key65001`, ...) to their presentation values; list values are
/// comma separated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SvcbValue {
    pub priority: u16,
    pub target: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}
