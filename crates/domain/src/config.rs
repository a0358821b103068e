pub mod errors;
pub mod kv;
pub mod logging;
pub mod root;
pub mod server;
pub mod upstream;
pub mod zone_settings;

pub use errors::ConfigError;
pub use kv::KvConfig;
pub use logging::LoggingConfig;
pub use root::{CliOverrides, Config};
pub use server::ServerConfig;
pub use upstream::UpstreamConfig;
pub use zone_settings::{FlatteningPolicy, KvCacheOptions, ZoneSettings};
