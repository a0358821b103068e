use super::encoders::authority_soa;
use super::engine::ZoneEngine;
use hickory_proto::rr::Record;
use kvdns_domain::soa::SoaData;
use kvdns_domain::{DomainError, RecordKey, SubRecordKind, ZoneSettings};
use tracing::warn;

impl ZoneEngine {
    /// SOA data of `zone`: the first SOA entry of the apex document, otherwise
    /// the synthesized defaults.
    pub(crate) async fn find_soa(
        &self,
        settings: &ZoneSettings,
        zone: &str,
    ) -> Result<SoaData, DomainError> {
        let apex = self.fetch_document(settings, &RecordKey::apex(zone)).await?;

        let stored = apex
            .as_ref()
            .and_then(|record| record.of_kind(SubRecordKind::SOA).next());

        match stored {
            Some(sub) => sub.decode_value("SOA"),
            None => Ok(SoaData::synthesized(zone)),
        }
    }

    /// Authority-section SOA for negative answers, or `None` when it cannot be
    /// obtained.
    pub(crate) async fn negative_soa(&self, settings: &ZoneSettings, zone: &str) -> Option<Record> {
        let result = match self.find_soa(settings, zone).await {
            Ok(soa) => authority_soa(zone, &soa),
            Err(e) => Err(e),
        };

        match result {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(zone = %zone, error = %e, "Unable to obtain SOA for zone");
                None
            }
        }
    }
}
