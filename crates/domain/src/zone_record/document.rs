use super::SubRecordKind;
use crate::DomainError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// TTL applied when a document does not carry one.
pub const DEFAULT_TTL: u32 = 3600;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ZoneRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,

    #[serde(default)]
    pub records: Vec<SubRecord>,
}

impl ZoneRecord {
    pub fn decode(bytes: &[u8]) -> Result<Self, DomainError> {
        serde_json::from_slice(bytes).map_err(|e| DomainError::DecodeError(e.to_string()))
    }

    pub fn ttl_or_default(&self) -> u32 {
        self.ttl.unwrap_or(DEFAULT_TTL)
    }

    /// Sub-records of a given kind, in document order.
    pub fn of_kind(&self, kind: SubRecordKind) -> impl Iterator<Item = &SubRecord> {
        self.records.iter().filter(move |r| r.kind() == Some(kind))
    }

    pub fn has_kind(&self, kind: SubRecordKind) -> bool {
        self.of_kind(kind).next().is_some()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubRecord {
    #[serde(rename = "type")]
    pub record_type: String,

    pub value: Box<RawValue>,
}

impl SubRecord {
    /// `None` for types this server does not know how to encode.
    pub fn kind(&self) -> Option<SubRecordKind> {
        self.record_type.parse().ok()
    }

    /// Decodes the payload into the shape expected by `record_type`.
    pub fn decode_value<T: DeserializeOwned>(
        &self,
        record_type: &'static str,
    ) -> Result<T, DomainError> {
        serde_json::from_str(self.value.get()).map_err(|e| {
            DomainError::DecodeError(format!("{} value {}: {}", record_type, self.value, e))
        })
    }

    pub fn raw(&self) -> &str {
        self.value.get()
    }
}
