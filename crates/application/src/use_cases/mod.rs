pub mod config;
pub mod zone;

pub use config::{shared_settings, ApplyZoneSettingsUseCase, SharedSettings};
pub use zone::{SubQuery, ZoneEngine};
