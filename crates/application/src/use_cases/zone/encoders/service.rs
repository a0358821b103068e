use super::parse_name;
use hickory_proto::rr::rdata::SRV;
use hickory_proto::rr::{Name, RData, Record};
use kvdns_domain::zone_record::SrvValue;
use kvdns_domain::{DomainError, SubRecord};

pub(crate) fn append_srv(
    section: &mut Vec<Record>,
    owner: &Name,
    ttl: u32,
    sub: &SubRecord,
) -> Result<usize, DomainError> {
    let values: Vec<SrvValue> = sub.decode_value("SRV")?;

    for srv in &values {
        let target = parse_name("SRV", &srv.target)?;
        section.push(Record::from_rdata(
            owner.clone(),
            ttl,
            RData::SRV(SRV::new(srv.priority, srv.weight, srv.port, target)),
        ));
    }

    Ok(values.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::zone::encoders::owner_name;
    use kvdns_domain::ZoneRecord;

    #[test]
    fn test_srv_fields_and_defaults() {
        let doc = br#"{"records": [{"type": "SRV", "value": [
            {"target": "sip1.example.com", "port": 5060, "priority": 10, "weight": 20},
            {"target": "sip2.example.com", "port": 5061}
        ]}]}"#;
        let record = ZoneRecord::decode(doc).unwrap();
        let owner = owner_name("_sip._udp.example.com").unwrap();
        let mut answers = Vec::new();

        let n = append_srv(&mut answers, &owner, 120, &record.records[0]).unwrap();
        assert_eq!(n, 2);

        match answers[0].data() {
            RData::SRV(srv) => {
                assert_eq!(srv.priority(), 10);
                assert_eq!(srv.weight(), 20);
                assert_eq!(srv.port(), 5060);
                assert_eq!(srv.target().to_string(), "sip1.example.com.");
            }
            other => panic!("unexpected rdata {:?}", other),
        }
        match answers[1].data() {
            RData::SRV(srv) => assert_eq!((srv.priority(), srv.weight()), (0, 0)),
            other => panic!("unexpected rdata {:?}", other),
        }
    }
}
