//! Zone documents as stored in the KV store.
//!
//! A document is `{"ttl": <int?>, "records": [{"type": "...", "value": ...}]}`.
//! Each sub-record keeps its value undecoded until the encoder for its type
//! asks for it, so one malformed entry only fails queries that reach it.

mod document;
mod kind;
mod payload;

pub use document::{SubRecord, ZoneRecord, DEFAULT_TTL};
pub use kind::SubRecordKind;
pub use payload::{SrvValue, SvcbValue};
