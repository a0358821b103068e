use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{Name, RData, Record};
use kvdns_domain::{DomainError, SubRecord};
use std::net::{Ipv4Addr, Ipv6Addr};

pub(crate) fn append_a(
    section: &mut Vec<Record>,
    owner: &Name,
    ttl: u32,
    sub: &SubRecord,
) -> Result<usize, DomainError> {
    let values: Vec<String> = sub.decode_value("A")?;

    for value in &values {
        let ip: Ipv4Addr = value.trim().parse().map_err(|_| {
            DomainError::invalid_value("A", format!("'{}' is not an IPv4 address", value))
        })?;
        section.push(Record::from_rdata(owner.clone(), ttl, RData::A(A(ip))));
    }

    Ok(values.len())
}

pub(crate) fn append_aaaa(
    section: &mut Vec<Record>,
    owner: &Name,
    ttl: u32,
    sub: &SubRecord,
) -> Result<usize, DomainError> {
    let values: Vec<String> = sub.decode_value("AAAA")?;

    for value in &values {
        let ip: Ipv6Addr = value.trim().parse().map_err(|_| {
            DomainError::invalid_value("AAAA", format!("'{}' is not an IPv6 address", value))
        })?;
        section.push(Record::from_rdata(owner.clone(), ttl, RData::AAAA(AAAA(ip))));
    }

    Ok(values.len())
}
