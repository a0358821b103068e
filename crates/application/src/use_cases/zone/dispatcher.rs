use super::encoders::{
    append_a, append_aaaa, append_dnssd_ptr, append_ns, append_ptr, append_srv, append_svcb,
    append_txt, is_dns_sd_query, owner_name, soa_record,
};
use super::engine::ZoneEngine;
use super::lookup::Lookup;
use hickory_proto::rr::{Name, Record, RecordType};
use kvdns_domain::soa::SoaData;
use kvdns_domain::{DomainError, RecordKey, SubRecord, SubRecordKind, ZoneRecord};
use tracing::debug;

impl ZoneEngine {
    /// Runs the encoder of every sub-record compatible with the query type and
    /// reports whether the requested type was satisfied.
    ///
    /// For HTTPS queries, A, AAAA and CNAME entries are used only while no
    /// earlier HTTPS entry of the document has produced an answer. TXT entries
    /// always contribute: to the answer for TXT queries and to the additional
    /// section otherwise.
    pub(crate) async fn dispatch(
        &self,
        lookup: Lookup<'_>,
        key: &RecordKey,
        record: &ZoneRecord,
        answers: &mut Vec<Record>,
        additionals: &mut Vec<Record>,
    ) -> Result<bool, DomainError> {
        let owner = owner_name(lookup.qname)?;
        let ttl = record.ttl_or_default();
        let qtype = lookup.qtype;

        let mut found = false;
        let mut https_found = false;

        for sub in &record.records {
            let Some(kind) = sub.kind() else {
                debug!(record_type = %sub.record_type, "Ignoring unsupported record type");
                continue;
            };

            match kind {
                SubRecordKind::A | SubRecordKind::AAAA | SubRecordKind::CNAME
                    if qtype == RecordType::HTTPS =>
                {
                    if !https_found {
                        self.https_fallback(lookup, kind, &owner, ttl, sub, answers)
                            .await?;
                    }
                }
                SubRecordKind::A if qtype == RecordType::A => {
                    found |= append_a(answers, &owner, ttl, sub)? > 0;
                }
                SubRecordKind::AAAA if qtype == RecordType::AAAA => {
                    found |= append_aaaa(answers, &owner, ttl, sub)? > 0;
                }
                SubRecordKind::CNAME
                    if matches!(
                        qtype,
                        RecordType::CNAME | RecordType::A | RecordType::AAAA
                    ) =>
                {
                    self.resolve_cname(lookup, &owner, ttl, sub, answers).await?;
                    found = true;
                }
                SubRecordKind::NS if qtype == RecordType::NS => {
                    found |= append_ns(answers, &owner, ttl, sub)? > 0;
                }
                SubRecordKind::PTR if qtype == RecordType::PTR => {
                    let appended = if is_dns_sd_query(&key.name) {
                        append_dnssd_ptr(answers, &owner, ttl, sub)?
                    } else {
                        append_ptr(answers, &owner, ttl, sub)?
                    };
                    found |= appended > 0;
                }
                SubRecordKind::SRV if qtype == RecordType::SRV => {
                    found |= append_srv(answers, &owner, ttl, sub)? > 0;
                }
                SubRecordKind::TXT => {
                    if qtype == RecordType::TXT {
                        found |= append_txt(answers, &owner, ttl, sub)? > 0;
                    } else {
                        append_txt(additionals, &owner, ttl, sub)?;
                    }
                }
                SubRecordKind::SOA if matches!(qtype, RecordType::SOA | RecordType::ANY) => {
                    let soa: SoaData = sub.decode_value("SOA")?;
                    answers.push(soa_record(&owner, ttl, &soa)?);
                    found = true;
                }
                SubRecordKind::SVCB | SubRecordKind::HTTPS if u16::from(qtype) == kind.to_u16() => {
                    let appended = append_svcb(answers, &owner, ttl, sub, kind)?;
                    found |= appended > 0;
                    https_found |= kind == SubRecordKind::HTTPS && appended > 0;
                }
                _ => {}
            }
        }

        if matches!(qtype, RecordType::SVCB | RecordType::HTTPS) && !answers.is_empty() {
            found = true;
        }

        Ok(found)
    }

    async fn https_fallback(
        &self,
        lookup: Lookup<'_>,
        kind: SubRecordKind,
        owner: &Name,
        ttl: u32,
        sub: &SubRecord,
        answers: &mut Vec<Record>,
    ) -> Result<(), DomainError> {
        match kind {
            SubRecordKind::A => {
                append_a(answers, owner, ttl, sub)?;
            }
            SubRecordKind::AAAA => {
                append_aaaa(answers, owner, ttl, sub)?;
            }
            _ => {
                self.resolve_cname(lookup, owner, ttl, sub, answers).await?;
            }
        }
        Ok(())
    }
}
