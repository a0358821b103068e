use super::parse_name;
use hickory_proto::rr::rdata::{CNAME, NS, PTR};
use hickory_proto::rr::{Name, RData, Record};
use kvdns_domain::{DomainError, SubRecord};
use tracing::warn;

const DNS_SD_SUFFIXES: [&str; 3] = ["._dns-sd._udp.", "._tcp.", "._udp."];

/// Service-discovery browse and instance names get the DNS-SD PTR encoding.
/// `record_name` is the name inside the zone, e.g. `_http._tcp`.
pub(crate) fn is_dns_sd_query(record_name: &str) -> bool {
    let name = kvdns_domain::fqdn(record_name).to_ascii_lowercase();
    DNS_SD_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Letters, digits, `-` and `.` only, with at least one dot.
pub(crate) fn is_valid_hostname(name: &str) -> bool {
    name.contains('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
}

/// Decodes a CNAME payload into its target and the record pointing at it.
pub(crate) fn cname_target(
    owner: &Name,
    ttl: u32,
    sub: &SubRecord,
) -> Result<(String, Record), DomainError> {
    let alias: String = sub.decode_value("CNAME")?;
    let target = parse_name("CNAME", &alias)?;
    let record = Record::from_rdata(owner.clone(), ttl, RData::CNAME(CNAME(target)));
    Ok((alias.trim().to_string(), record))
}

pub(crate) fn append_ns(
    section: &mut Vec<Record>,
    owner: &Name,
    ttl: u32,
    sub: &SubRecord,
) -> Result<usize, DomainError> {
    let values: Vec<String> = sub.decode_value("NS")?;

    for value in &values {
        let target = parse_name("NS", value)?;
        section.push(Record::from_rdata(owner.clone(), ttl, RData::NS(NS(target))));
    }

    Ok(values.len())
}

/// Reverse-lookup pointers. Empty entries are ignored and entries failing the
/// hostname check are skipped with a warning.
pub(crate) fn append_ptr(
    section: &mut Vec<Record>,
    owner: &Name,
    ttl: u32,
    sub: &SubRecord,
) -> Result<usize, DomainError> {
    let values: Vec<String> = sub.decode_value("PTR")?;
    let mut appended = 0;

    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        if !is_valid_hostname(value) {
            warn!(owner = %owner, target = %value, "Skipping invalid PTR target");
            continue;
        }

        let target = parse_name("PTR", value)?;
        section.push(Record::from_rdata(owner.clone(), ttl, RData::PTR(PTR(target))));
        appended += 1;
    }

    Ok(appended)
}

/// Builds a name from raw labels split on unescaped dots. Instance labels of
/// DNS-SD names may hold spaces and punctuation; `\.` keeps a literal dot
/// inside a label.
pub(crate) fn dnssd_name(value: &str) -> Result<Name, DomainError> {
    let mut labels: Vec<Vec<u8>> = Vec::new();
    let mut label = Vec::new();
    let mut bytes = value.trim().bytes();

    while let Some(b) = bytes.next() {
        match b {
            b'\\' => {
                let escaped = bytes.next().ok_or_else(|| {
                    DomainError::invalid_value("PTR", format!("'{}' ends with an escape", value))
                })?;
                label.push(escaped);
            }
            b'.' => labels.push(std::mem::take(&mut label)),
            _ => label.push(b),
        }
    }
    if !label.is_empty() {
        labels.push(label);
    }

    if labels.is_empty() || labels.iter().any(Vec::is_empty) {
        return Err(DomainError::invalid_value(
            "PTR",
            format!("'{}' has an empty label", value),
        ));
    }

    Name::from_labels(labels.iter().map(Vec::as_slice)).map_err(|e| {
        DomainError::invalid_value("PTR", format!("'{}' is not a domain name: {}", value, e))
    })
}

/// DNS-SD pointers (service types and instance names), which may contain
/// characters the hostname check rejects.
pub(crate) fn append_dnssd_ptr(
    section: &mut Vec<Record>,
    owner: &Name,
    ttl: u32,
    sub: &SubRecord,
) -> Result<usize, DomainError> {
    let values: Vec<String> = sub.decode_value("PTR")?;
    let mut appended = 0;

    for value in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        let target = dnssd_name(value)?;
        section.push(Record::from_rdata(owner.clone(), ttl, RData::PTR(PTR(target))));
        appended += 1;
    }

    Ok(appended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::zone::encoders::owner_name;
    use kvdns_domain::ZoneRecord;

    fn sub(json: &str) -> SubRecord {
        let doc = format!(r#"{{"records": [{}]}}"#, json);
        ZoneRecord::decode(doc.as_bytes()).unwrap().records.remove(0)
    }

    #[test]
    fn test_dns_sd_suffixes() {
        assert!(is_dns_sd_query("_services._dns-sd._udp"));
        assert!(is_dns_sd_query("_http._tcp"));
        assert!(is_dns_sd_query("office._ipp._tcp."));
        assert!(is_dns_sd_query("_ntp._UDP"));
        assert!(!is_dns_sd_query("_http._tcp.lab"));
        assert!(!is_dns_sd_query("4.3.2.1"));
    }

    #[test]
    fn test_hostname_check() {
        assert!(is_valid_hostname("host-1.example.com"));
        assert!(!is_valid_hostname("localhost"));
        assert!(!is_valid_hostname("bad_name.example.com"));
        assert!(!is_valid_hostname("space here.example.com"));
    }

    #[test]
    fn test_ptr_skips_invalid_and_empty_entries() {
        let owner = owner_name("2.0.168.192.in-addr.arpa").unwrap();
        let mut answers = Vec::new();

        let n = append_ptr(
            &mut answers,
            &owner,
            60,
            &sub(r#"{"type": "PTR", "value": ["host.example.com", "", "not valid", "nodot"]}"#),
        )
        .unwrap();

        assert_eq!(n, 1);
        assert_eq!(answers.len(), 1);
    }

    #[test]
    fn test_dnssd_name_keeps_raw_instance_labels() {
        let name = dnssd_name("My Printer._ipp._tcp.example.com").unwrap();
        assert!(name.is_fqdn());
        assert_eq!(name.num_labels(), 5);
        assert_eq!(name.iter().next(), Some(&b"My Printer"[..]));

        let escaped = dnssd_name(r"Floor 2\.East._http._tcp.example.com.").unwrap();
        assert_eq!(escaped.num_labels(), 5);
        assert_eq!(escaped.iter().next(), Some(&b"Floor 2.East"[..]));

        assert!(dnssd_name("a..b.example.com").is_err());
        assert!(dnssd_name("trailing\\").is_err());
    }

    #[test]
    fn test_dnssd_ptr_accepts_spaces() {
        let owner = owner_name("_ipp._tcp.example.com").unwrap();
        let mut answers = Vec::new();

        let n = append_dnssd_ptr(
            &mut answers,
            &owner,
            60,
            &sub(r#"{"type": "PTR", "value": ["Office Printer (2nd floor)._ipp._tcp.example.com", ""]}"#),
        )
        .unwrap();

        assert_eq!(n, 1);
        match answers[0].data() {
            RData::PTR(ptr) => assert_eq!(ptr.0.iter().next(), Some(&b"Office Printer (2nd floor)"[..])),
            other => panic!("unexpected rdata {:?}", other),
        }
    }

    #[test]
    fn test_cname_target_is_fully_qualified() {
        let owner = owner_name("www.example.com").unwrap();
        let (alias, record) = cname_target(
            &owner,
            60,
            &sub(r#"{"type": "CNAME", "value": "web.example.com"}"#),
        )
        .unwrap();

        assert_eq!(alias, "web.example.com");
        match record.data() {
            RData::CNAME(target) => assert_eq!(target.0.to_string(), "web.example.com."),
            other => panic!("unexpected rdata {:?}", other),
        }
    }

    #[test]
    fn test_empty_ns_target_rejected() {
        let owner = owner_name("example.com").unwrap();
        let mut answers = Vec::new();
        assert!(append_ns(
            &mut answers,
            &owner,
            60,
            &sub(r#"{"type": "NS", "value": [" "]}"#),
        )
        .is_err());
    }
}
