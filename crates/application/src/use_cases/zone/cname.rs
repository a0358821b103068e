use super::encoders::cname_target;
use super::engine::{ZoneEngine, MAX_CNAME_DEPTH};
use super::lookup::{Lookup, LookupOutcome};
use super::sub_query::SubQuery;
use hickory_proto::rr::{Name, Record, RecordType};
use kvdns_domain::{match_zone, DomainError, FlatteningPolicy, SubRecord};
use tracing::{debug, warn};

impl ZoneEngine {
    /// Appends the CNAME record, then expands its target according to the
    /// flattening policy. Returns whether records beyond the CNAME were added.
    pub(crate) async fn resolve_cname(
        &self,
        lookup: Lookup<'_>,
        owner: &Name,
        ttl: u32,
        sub: &SubRecord,
        answers: &mut Vec<Record>,
    ) -> Result<bool, DomainError> {
        let (alias, record) = cname_target(owner, ttl, sub)?;
        answers.push(record);

        let policy = lookup.settings.flattening;
        if policy == FlatteningPolicy::None {
            debug!(alias = %alias, "CNAME flattening disabled, returning CNAME only");
            return Ok(false);
        }

        let Some(target) = match_zone(&lookup.settings.zones, &alias) else {
            if policy == FlatteningPolicy::Full {
                return Ok(self.resolve_external(lookup, &alias, answers).await);
            }
            debug!(alias = %alias, "CNAME target outside configured zones, not flattening");
            return Ok(false);
        };

        if lookup.depth >= MAX_CNAME_DEPTH {
            return Err(DomainError::CnameDepthExceeded {
                name: alias,
                limit: MAX_CNAME_DEPTH,
            });
        }

        // in-zone targets are always chased as A, whatever was asked
        let chase = Lookup {
            qname: &alias,
            qtype: RecordType::A,
            depth: lookup.depth + 1,
            ..lookup
        };

        match self.lookup(chase, target).await? {
            LookupOutcome::Answered {
                answers: chased, ..
            } => {
                debug!(alias = %alias, records = chased.len(), "Flattened CNAME target");
                answers.extend(chased);
                Ok(true)
            }
            _ => {
                debug!(alias = %alias, "No A record found for CNAME target");
                Ok(false)
            }
        }
    }

    /// Resolves an out-of-zone alias through the next handler and merges its
    /// answers. Failures leave the CNAME as the only answer.
    async fn resolve_external(
        &self,
        lookup: Lookup<'_>,
        alias: &str,
        answers: &mut Vec<Record>,
    ) -> bool {
        let Some(next) = &self.next else {
            warn!(alias = %alias, "No next handler for external CNAME target");
            return false;
        };

        debug!(alias = %alias, next = next.name(), "Resolving external CNAME target");
        let sub_query = SubQuery::new(lookup.query, alias, lookup.query.query_type);

        match sub_query.resolve(next.as_ref()).await {
            Ok(external) => {
                let added = !external.is_empty();
                answers.extend(external);
                added
            }
            Err(e) => {
                warn!(alias = %alias, error = %e, "Error in external CNAME resolution");
                self.metrics.record_plugin_error(e.source.kind());
                false
            }
        }
    }
}
