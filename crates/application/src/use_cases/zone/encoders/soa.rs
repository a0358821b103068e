use super::{owner_name, parse_name};
use hickory_proto::rr::rdata::SOA;
use hickory_proto::rr::{Name, RData, Record};
use kvdns_domain::{DomainError, SoaData};

fn clamp(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

pub(crate) fn soa_record(owner: &Name, ttl: u32, soa: &SoaData) -> Result<Record, DomainError> {
    let mname = parse_name("SOA", &soa.mname)?;
    let rname = parse_name("SOA", &soa.mailbox())?;

    Ok(Record::from_rdata(
        owner.clone(),
        ttl,
        RData::SOA(SOA::new(
            mname,
            rname,
            soa.serial,
            clamp(soa.refresh),
            clamp(soa.retry),
            clamp(soa.expire),
            soa.minimum,
        )),
    ))
}

/// SOA for the Authority section of negative answers: owned by the zone apex,
/// with the negative-caching TTL.
pub(crate) fn authority_soa(zone: &str, soa: &SoaData) -> Result<Record, DomainError> {
    soa_record(&owner_name(zone)?, soa.minimum, soa)
}
