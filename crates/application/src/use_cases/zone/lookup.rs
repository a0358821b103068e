use super::engine::ZoneEngine;
use crate::metrics::{KV_STATUS_ERROR, KV_STATUS_NOT_FOUND, KV_STATUS_OK};
use crate::ports::ZoneQuery;
use futures::future::BoxFuture;
use hickory_proto::rr::{Record, RecordType};
use kvdns_domain::soa::SoaData;
use kvdns_domain::{DomainError, RecordKey, ZoneRecord, ZoneSettings};
use std::time::Instant;
use tracing::{debug, error};

/// Per-lookup state. `query` is the question the host asked; `qname` and
/// `qtype` differ from it while a CNAME target is being chased.
#[derive(Clone, Copy)]
pub(crate) struct Lookup<'a> {
    pub settings: &'a ZoneSettings,
    pub query: &'a ZoneQuery,
    pub qname: &'a str,
    pub qtype: RecordType,
    pub depth: usize,
}

#[derive(Debug)]
pub(crate) enum LookupOutcome {
    Answered {
        answers: Vec<Record>,
        additionals: Vec<Record>,
    },
    NoData {
        soa: Record,
    },
    NxDomain {
        soa: Option<Record>,
    },
    Fallthrough,
}

impl ZoneEngine {
    /// Exact record, then the zone wildcard, then a negative answer.
    pub(crate) fn lookup<'a>(
        &'a self,
        lookup: Lookup<'a>,
        key: RecordKey,
    ) -> BoxFuture<'a, Result<LookupOutcome, DomainError>> {
        Box::pin(async move {
            let settings = lookup.settings;

            let record = match self.fetch_document(settings, &key).await? {
                Some(record) => record,
                None if key.is_apex() => {
                    if settings.fallthrough {
                        return Ok(LookupOutcome::Fallthrough);
                    }
                    debug!(zone = %key.zone, "No apex document for zone");
                    let soa = super::encoders::authority_soa(
                        &key.zone,
                        &SoaData::synthesized(&key.zone),
                    )?;
                    return Ok(LookupOutcome::NxDomain { soa: Some(soa) });
                }
                None => {
                    let wildcard = RecordKey::wildcard(&key.zone);
                    match self.fetch_document(settings, &wildcard).await? {
                        Some(record) => {
                            debug!(name = %lookup.qname, "Answering from wildcard record");
                            record
                        }
                        None => {
                            if settings.fallthrough {
                                return Ok(LookupOutcome::Fallthrough);
                            }
                            let soa = self.negative_soa(settings, &key.zone).await;
                            return Ok(LookupOutcome::NxDomain { soa });
                        }
                    }
                }
            };

            let mut answers = Vec::new();
            let mut additionals = Vec::new();
            let found = self
                .dispatch(lookup, &key, &record, &mut answers, &mut additionals)
                .await?;

            if found && !answers.is_empty() {
                return Ok(LookupOutcome::Answered {
                    answers,
                    additionals,
                });
            }

            if settings.fallthrough {
                return Ok(LookupOutcome::Fallthrough);
            }

            Ok(match self.negative_soa(settings, &key.zone).await {
                Some(soa) => LookupOutcome::NoData { soa },
                None => LookupOutcome::NxDomain { soa: None },
            })
        })
    }

    /// Fetches and decodes the document at `key`. `None` when the key is absent.
    pub(crate) async fn fetch_document(
        &self,
        settings: &ZoneSettings,
        key: &RecordKey,
    ) -> Result<Option<ZoneRecord>, DomainError> {
        let kv_key = key.to_kv_key(&settings.prefix);
        debug!(key = %kv_key, "Fetching zone document");

        let start = Instant::now();
        let result = self.kv.get(&kv_key, &settings.cache).await;
        let elapsed = start.elapsed();

        let bytes = match result {
            Ok(Some(bytes)) => {
                self.metrics.record_kv_request(KV_STATUS_OK, elapsed);
                bytes
            }
            Ok(None) => {
                self.metrics.record_kv_request(KV_STATUS_NOT_FOUND, elapsed);
                return Ok(None);
            }
            Err(e) => {
                self.metrics.record_kv_request(KV_STATUS_ERROR, elapsed);
                error!(key = %kv_key, error = %e, "Error fetching from KV store");
                return Err(e);
            }
        };

        ZoneRecord::decode(&bytes).map(Some).map_err(|e| {
            error!(key = %kv_key, error = %e, "Error decoding zone document");
            e
        })
    }
}
