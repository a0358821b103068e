//! Sub-record encoders.
//!
//! Each encoder decodes one sub-record payload and appends one resource record
//! per element to the section it is given, owned by the query name and carrying
//! the document TTL. A payload that does not decode, or an element that cannot
//! be represented on the wire, fails the whole query.

mod address;
mod names;
mod service;
mod soa;
mod svcb;
mod txt;

pub(crate) use address::{append_a, append_aaaa};
pub(crate) use names::{
    append_dnssd_ptr, append_ns, append_ptr, cname_target, is_dns_sd_query, is_valid_hostname,
};
pub(crate) use service::append_srv;
pub(crate) use soa::{authority_soa, soa_record};
pub(crate) use svcb::append_svcb;
pub(crate) use txt::append_txt;

use hickory_proto::rr::Name;
use kvdns_domain::{fqdn, DomainError};
use std::str::FromStr;

/// Parses a presentation-format name, making it fully qualified.
pub(crate) fn parse_name(record_type: &'static str, value: &str) -> Result<Name, DomainError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DomainError::invalid_value(record_type, "empty name"));
    }

    Name::from_str(&fqdn(value)).map_err(|e| {
        DomainError::invalid_value(record_type, format!("'{}' is not a domain name: {}", value, e))
    })
}

/// Parses the owner name of a query.
pub(crate) fn owner_name(qname: &str) -> Result<Name, DomainError> {
    Name::from_str(&fqdn(qname))
        .map_err(|e| DomainError::InvalidDomainName(format!("{}: {}", qname, e)))
}
