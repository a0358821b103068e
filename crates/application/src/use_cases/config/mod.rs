mod apply_settings;

pub use apply_settings::{shared_settings, ApplyZoneSettingsUseCase, SharedSettings};
