use kvdns_domain::soa::{process_serial, SoaData};
use kvdns_domain::{SubRecordKind, ZoneRecord};

#[test]
fn test_synthesized_soa_defaults() {
    let soa = SoaData::synthesized("example.com");

    assert_eq!(soa.mname, "ns.example.com");
    assert_eq!(soa.rname, "hostmaster.example.com");
    assert_eq!(soa.refresh, 3600);
    assert_eq!(soa.retry, 600);
    assert_eq!(soa.expire, 86400);
    assert_eq!(soa.minimum, 3600);
}

#[test]
fn test_serial_is_stable_for_process() {
    let first = SoaData::synthesized("a.test").serial;
    let second = SoaData::synthesized("b.test").serial;

    assert_eq!(first, second);
    assert_eq!(first, process_serial());
}

#[test]
fn test_stored_soa_decodes_from_apex_document() {
    let record = ZoneRecord::decode(
        br#"{"records": [{"type": "SOA", "value": {
            "mname": "ns1.example.com",
            "rname": "admin@example.com",
            "serial": 2024010101,
            "minimum": 300
        }}]}"#,
    )
    .unwrap();

    let sub = record.of_kind(SubRecordKind::SOA).next().unwrap();
    let soa: SoaData = sub.decode_value("SOA").unwrap();

    assert_eq!(soa.serial, 2024010101);
    assert_eq!(soa.minimum, 300);
    assert_eq!(soa.refresh, 3600);
    assert_eq!(soa.mailbox(), "admin.example.com");
}
