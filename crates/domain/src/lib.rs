//! kvdns domain layer
pub mod config;
pub mod errors;
pub mod soa;
pub mod zone;
pub mod zone_record;

pub use config::{
    CliOverrides, Config, ConfigError, FlatteningPolicy, KvCacheOptions, KvConfig, LoggingConfig,
    ServerConfig, UpstreamConfig, ZoneSettings,
};
pub use errors::DomainError;
pub use soa::SoaData;
pub use zone::{build_key, fqdn, match_zone, normalize_name, RecordKey};
pub use zone_record::{SubRecord, SubRecordKind, ZoneRecord};
