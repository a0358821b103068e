use crate::metrics::{EngineMetrics, CONFIG_STATUS_ERROR, CONFIG_STATUS_OK};
use arc_swap::ArcSwap;
use kvdns_domain::{DomainError, ZoneSettings};
use std::sync::Arc;
use tracing::{error, info};

/// Zone settings shared between the engine and whatever updates them. Each
/// request loads one snapshot; updates replace it wholesale.
pub type SharedSettings = Arc<ArcSwap<ZoneSettings>>;

pub fn shared_settings(settings: ZoneSettings) -> SharedSettings {
    Arc::new(ArcSwap::from_pointee(settings))
}

/// Applies a settings document (the `<prefix>/config` KV entry) on top of the
/// current snapshot.
pub struct ApplyZoneSettingsUseCase {
    settings: SharedSettings,
    metrics: EngineMetrics,
}

impl ApplyZoneSettingsUseCase {
    pub fn new(settings: SharedSettings, metrics: EngineMetrics) -> Self {
        Self { settings, metrics }
    }

    pub fn execute(&self, document: &[u8]) -> Result<Arc<ZoneSettings>, DomainError> {
        let current = self.settings.load_full();

        let updated = match current.apply_document(document) {
            Ok(settings) => Arc::new(settings),
            Err(e) => {
                error!(error = %e, "Rejected zone settings document");
                self.metrics.record_config_update(CONFIG_STATUS_ERROR);
                return Err(DomainError::ConfigError(e.to_string()));
            }
        };

        self.settings.store(Arc::clone(&updated));
        self.metrics.record_config_update(CONFIG_STATUS_OK);

        info!(
            prefix = %updated.prefix,
            zones = ?updated.zones,
            flattening = %updated.flattening,
            fallthrough = updated.fallthrough,
            "Zone settings updated"
        );

        Ok(updated)
    }
}
