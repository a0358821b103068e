//! Zone matching and KV key construction.
//!
//! Zones are matched in configuration order and the first suffix match wins,
//! even when a later zone would be a longer (more specific) suffix. Operators
//! that configure overlapping zones such as `com` and `example.com` control
//! precedence through list order.

use std::fmt;

/// Record name of the zone apex document.
pub const APEX: &str = "@";

/// Record name of the zone wildcard document.
pub const WILDCARD: &str = "*";

/// Location of a zone document: the configured zone and the record name inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub zone: String,
    pub name: String,
}

impl RecordKey {
    pub fn new(zone: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            name: name.into(),
        }
    }

    pub fn apex(zone: impl Into<String>) -> Self {
        Self::new(zone, APEX)
    }

    pub fn wildcard(zone: impl Into<String>) -> Self {
        Self::new(zone, WILDCARD)
    }

    pub fn is_apex(&self) -> bool {
        self.name == APEX
    }

    pub fn to_kv_key(&self, prefix: &str) -> String {
        build_key(prefix, &self.zone, &self.name)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.zone, self.name)
    }
}

/// `prefix/zone/name`, used verbatim as the KV key. No escaping is applied, so a
/// record name containing `/` addresses a different key.
pub fn build_key(prefix: &str, zone: &str, name: &str) -> String {
    let mut key = String::with_capacity(prefix.len() + zone.len() + name.len() + 2);
    key.push_str(prefix);
    key.push('/');
    key.push_str(zone);
    key.push('/');
    key.push_str(name);
    key
}

pub fn normalize_name(name: &str) -> &str {
    name.trim_end_matches('.')
}

/// Appends the root label if missing.
pub fn fqdn(name: &str) -> String {
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{}.", name)
    }
}

/// Finds the first configured zone containing `qname` and the record name left
/// after stripping that zone. Returns `None` when no zone matches.
pub fn match_zone<S: AsRef<str>>(zones: &[S], qname: &str) -> Option<RecordKey> {
    let qname = normalize_name(qname);

    for zone in zones {
        let zone = normalize_name(zone.as_ref());
        if zone.is_empty() {
            continue;
        }

        if let Some(name) = strip_zone(qname, zone) {
            let name = if name.is_empty() {
                APEX.to_string()
            } else {
                name.to_ascii_lowercase()
            };
            return Some(RecordKey::new(zone, name));
        }
    }

    None
}

fn strip_zone<'a>(qname: &'a str, zone: &str) -> Option<&'a str> {
    if qname.len() < zone.len() {
        return None;
    }

    let split = qname.len() - zone.len();
    if !qname.is_char_boundary(split) || !qname[split..].eq_ignore_ascii_case(zone) {
        return None;
    }

    if split == 0 {
        return Some("");
    }

    let rest = &qname[..split];
    rest.strip_suffix('.')
}
