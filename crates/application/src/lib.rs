//! kvdns application layer: ports and the zone resolution engine.
pub mod metrics;
pub mod ports;
pub mod use_cases;

pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use ports::{
    Handler, KvStore, KvWatch, KvWatchEvent, ResponseCapture, ResponseWriter, ServeError,
    ZoneQuery, ZoneResponse,
};
pub use use_cases::{shared_settings, ApplyZoneSettingsUseCase, SharedSettings, ZoneEngine};
