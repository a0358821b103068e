use super::lookup::{Lookup, LookupOutcome};
use crate::metrics::EngineMetrics;
use crate::ports::{Handler, KvStore, ResponseWriter, ServeError, ZoneQuery, ZoneResponse};
use crate::use_cases::config::SharedSettings;
use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::Record;
use kvdns_domain::{match_zone, DomainError, ZoneSettings};
use std::sync::Arc;
use tracing::{debug, error, warn};

pub const ENGINE_NAME: &str = "kvdns";

/// Longest CNAME chain followed while flattening.
pub const MAX_CNAME_DEPTH: usize = 10;

/// Authoritative handler answering from zone documents in the KV store.
///
/// Names outside the configured zones, and misses when fallthrough is enabled,
/// are passed to the next handler.
pub struct ZoneEngine {
    pub(super) kv: Arc<dyn KvStore>,
    pub(super) settings: SharedSettings,
    pub(super) next: Option<Arc<dyn Handler>>,
    pub(super) metrics: EngineMetrics,
}

impl ZoneEngine {
    pub fn new(kv: Arc<dyn KvStore>, settings: SharedSettings) -> Self {
        Self {
            kv,
            settings,
            next: None,
            metrics: EngineMetrics::new(),
        }
    }

    pub fn with_next(mut self, next: Arc<dyn Handler>) -> Self {
        self.next = Some(next);
        self
    }

    pub fn with_metrics(mut self, metrics: EngineMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> Arc<ZoneSettings> {
        self.settings.load_full()
    }

    /// Whether the KV store answers.
    pub async fn ready(&self) -> bool {
        match self.kv.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "KV store not ready");
                false
            }
        }
    }

    async fn delegate(
        &self,
        query: &ZoneQuery,
        writer: &mut dyn ResponseWriter,
    ) -> Result<ResponseCode, ServeError> {
        match &self.next {
            Some(next) => next.serve(query, writer).await,
            None => {
                self.metrics
                    .record_plugin_error(DomainError::NoNextHandler(ENGINE_NAME).kind());
                write_error(
                    query,
                    writer,
                    ResponseCode::ServFail,
                    Some(DomainError::NoNextHandler(ENGINE_NAME)),
                )
            }
        }
    }
}

#[async_trait]
impl Handler for ZoneEngine {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    async fn serve(
        &self,
        query: &ZoneQuery,
        writer: &mut dyn ResponseWriter,
    ) -> Result<ResponseCode, ServeError> {
        let settings = self.settings.load_full();

        let Some(key) = match_zone(&settings.zones, &query.name) else {
            debug!(name = %query.name, "Name outside configured zones, passing to next handler");
            return self.delegate(query, writer).await;
        };

        let qtype = query.query_type.to_string();
        self.metrics.record_request(&key.zone, &qtype);
        debug!(zone = %key.zone, record = %key.name, qtype = %qtype, "Resolving zone record");

        let lookup = Lookup {
            settings: &settings,
            query,
            qname: &query.name,
            qtype: query.query_type,
            depth: 0,
        };

        let outcome = match self.lookup(lookup, key.clone()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(zone = %key.zone, record = %key.name, error = %e, "Zone lookup failed");
                self.metrics.record_failure(&key.zone, &qtype, e.kind());
                self.metrics.record_plugin_error(e.kind());
                return write_error(query, writer, ResponseCode::ServFail, Some(e));
            }
        };

        match outcome {
            LookupOutcome::Answered {
                answers,
                additionals,
            } => {
                debug!(name = %query.name, answers = answers.len(), "Sending DNS response");
                let mut response = authoritative_reply(query, ResponseCode::NoError);
                response.answers = answers;
                response.additionals = additionals;

                if let Err(e) = writer.write(response) {
                    error!(error = %e, "Failed to write DNS response");
                    self.metrics.record_failure(&key.zone, &qtype, e.kind());
                    return Err(ServeError::new(ResponseCode::ServFail, e));
                }

                self.metrics.record_success(&key.zone, &qtype);
                Ok(ResponseCode::NoError)
            }
            LookupOutcome::NoData { soa } => {
                debug!(name = %query.name, qtype = %qtype, "Requested type not found (NODATA)");
                self.metrics.record_failure(&key.zone, &qtype, "NODATA");
                write_negative(query, writer, ResponseCode::NoError, Some(soa))
            }
            LookupOutcome::NxDomain { soa } => {
                warn!(name = %query.name, zone = %key.zone, "No record found (NXDOMAIN)");
                self.metrics.record_failure(&key.zone, &qtype, "NXDOMAIN");
                write_negative(query, writer, ResponseCode::NXDomain, soa)
            }
            LookupOutcome::Fallthrough => {
                debug!(name = %query.name, "No answer, falling through to next handler");
                self.delegate(query, writer).await
            }
        }
    }
}

fn authoritative_reply(query: &ZoneQuery, rcode: ResponseCode) -> ZoneResponse {
    let mut response = ZoneResponse::with_code(query, rcode);
    response.authoritative = true;
    response
}

fn write_negative(
    query: &ZoneQuery,
    writer: &mut dyn ResponseWriter,
    rcode: ResponseCode,
    soa: Option<Record>,
) -> Result<ResponseCode, ServeError> {
    let mut response = authoritative_reply(query, rcode);
    response.authority.extend(soa);

    writer.write(response).map_err(|e| {
        error!(error = %e, "Failed to write negative response");
        ServeError::new(ResponseCode::ServFail, e)
    })?;

    Ok(rcode)
}

/// Writes an empty error reply. Server failures advertise recursion so that
/// stub resolvers retry elsewhere.
fn write_error(
    query: &ZoneQuery,
    writer: &mut dyn ResponseWriter,
    rcode: ResponseCode,
    cause: Option<DomainError>,
) -> Result<ResponseCode, ServeError> {
    let mut response = authoritative_reply(query, rcode);
    response.recursion_available = rcode == ResponseCode::ServFail;

    if let Err(e) = writer.write(response) {
        error!(error = %e, "Failed to write DNS error response");
        return Err(ServeError::new(ResponseCode::ServFail, e));
    }

    match cause {
        Some(e) => Err(ServeError::new(rcode, e)),
        None => Ok(rcode),
    }
}
