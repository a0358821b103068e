use super::parse_name;
use hickory_proto::rr::rdata::svcb::{
    Alpn, IpHint, Mandatory, SvcParamKey, SvcParamValue, Unknown, SVCB,
};
use hickory_proto::rr::rdata::{A, AAAA, HTTPS};
use hickory_proto::rr::{Name, RData, Record};
use kvdns_domain::zone_record::SvcbValue;
use kvdns_domain::{DomainError, SubRecord, SubRecordKind};
use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::{debug, warn};

const KEY_MANDATORY: u16 = 0;
const KEY_ALPN: u16 = 1;
const KEY_NO_DEFAULT_ALPN: u16 = 2;
const KEY_PORT: u16 = 3;
const KEY_IPV4HINT: u16 = 4;
const KEY_IPV6HINT: u16 = 6;
const KEY_DOHPATH: u16 = 7;

/// First and last code of the private-use range (RFC 9460 section 14.3.2).
/// Named keys without a registered code are numbered from here.
const PRIVATE_USE_FIRST: u16 = 65280;
const PRIVATE_USE_LAST: u16 = 65534;

/// Maps a presentation key (`alpn`, `key65001`, `65001`) to its code.
pub(crate) fn key_code(key: &str) -> Option<u16> {
    let key = key.trim().to_ascii_lowercase();
    match key.as_str() {
        "mandatory" => Some(KEY_MANDATORY),
        "alpn" => Some(KEY_ALPN),
        "no-default-alpn" => Some(KEY_NO_DEFAULT_ALPN),
        "port" => Some(KEY_PORT),
        "ipv4hint" => Some(KEY_IPV4HINT),
        "ipv6hint" => Some(KEY_IPV6HINT),
        "dohpath" => Some(KEY_DOHPATH),
        other => other.strip_prefix("key").unwrap_or(other).parse().ok(),
    }
}

fn list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|v| !v.is_empty())
}

fn param_value(
    record_type: &'static str,
    code: u16,
    value: &str,
) -> Result<SvcParamValue, DomainError> {
    let value = match code {
        KEY_MANDATORY => {
            let keys = list(value)
                .map(|k| {
                    key_code(k).map(SvcParamKey::from).ok_or_else(|| {
                        DomainError::invalid_value(record_type, format!("unknown mandatory key '{}'", k))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            SvcParamValue::Mandatory(Mandatory(keys))
        }
        KEY_ALPN => SvcParamValue::Alpn(Alpn(list(value).map(str::to_string).collect())),
        KEY_NO_DEFAULT_ALPN => SvcParamValue::NoDefaultAlpn,
        KEY_PORT => {
            let port = value.trim().parse::<u16>().map_err(|_| {
                DomainError::invalid_value(record_type, format!("invalid port '{}'", value))
            })?;
            SvcParamValue::Port(port)
        }
        KEY_IPV4HINT => {
            let hints = list(value)
                .map(|ip| {
                    ip.parse::<Ipv4Addr>().map(A).map_err(|_| {
                        DomainError::invalid_value(record_type, format!("invalid ipv4hint '{}'", ip))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            SvcParamValue::Ipv4Hint(IpHint(hints))
        }
        KEY_IPV6HINT => {
            let hints = list(value)
                .map(|ip| {
                    ip.parse::<Ipv6Addr>().map(AAAA).map_err(|_| {
                        DomainError::invalid_value(record_type, format!("invalid ipv6hint '{}'", ip))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            SvcParamValue::Ipv6Hint(IpHint(hints))
        }
        KEY_DOHPATH => SvcParamValue::Unknown(Unknown(value.as_bytes().to_vec())),
        _ => SvcParamValue::Unknown(Unknown(value.as_bytes().to_vec())),
    };

    Ok(value)
}

/// Encodes SVCB or HTTPS entries. Parameters are emitted in ascending key
/// order. Keys that are neither known names nor numeric are carried as opaque
/// values under private-use codes, assigned in key name order.
pub(crate) fn append_svcb(
    section: &mut Vec<Record>,
    owner: &Name,
    ttl: u32,
    sub: &SubRecord,
    kind: SubRecordKind,
) -> Result<usize, DomainError> {
    let record_type = kind.as_str();
    let values: Vec<SvcbValue> = sub.decode_value(record_type)?;

    for entry in &values {
        let target = parse_name(record_type, &entry.target)?;

        let mut params = Vec::with_capacity(entry.params.len());
        let mut unnamed = Vec::new();
        for (key, value) in &entry.params {
            match key_code(key) {
                Some(code) => params.push((code, param_value(record_type, code, value)?)),
                None => unnamed.push((key, value)),
            }
        }

        let mut next_private = PRIVATE_USE_FIRST;
        for (key, value) in unnamed {
            while next_private <= PRIVATE_USE_LAST
                && params.iter().any(|(code, _)| *code == next_private)
            {
                next_private += 1;
            }
            if next_private > PRIVATE_USE_LAST {
                warn!(owner = %owner, key = %key, "No private-use code left for SVCB parameter");
                continue;
            }
            debug!(owner = %owner, key = %key, code = next_private, "Unregistered SVCB parameter");
            params.push((
                next_private,
                SvcParamValue::Unknown(Unknown(value.as_bytes().to_vec())),
            ));
            next_private += 1;
        }
        params.sort_by_key(|(code, _)| *code);
        params.dedup_by_key(|(code, _)| *code);

        let svcb = SVCB::new(
            entry.priority,
            target,
            params
                .into_iter()
                .map(|(code, value)| (SvcParamKey::from(code), value))
                .collect(),
        );

        let rdata = match kind {
            SubRecordKind::HTTPS => RData::HTTPS(HTTPS(svcb)),
            _ => RData::SVCB(svcb),
        };
        section.push(Record::from_rdata(owner.clone(), ttl, rdata));
    }

    Ok(values.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::zone::encoders::owner_name;
    use kvdns_domain::ZoneRecord;

    fn encode(json: &str, kind: SubRecordKind) -> Result<Vec<Record>, DomainError> {
        let doc = format!(
            r#"{{"records": [{{"type": "{}", "value": {}}}]}}"#,
            kind.as_str(),
            json
        );
        let record = ZoneRecord::decode(doc.as_bytes()).unwrap();
        let owner = owner_name("example.com").unwrap();
        let mut section = Vec::new();
        append_svcb(&mut section, &owner, 300, &record.records[0], kind)?;
        Ok(section)
    }

    fn params(record: &Record) -> Vec<(SvcParamKey, SvcParamValue)> {
        match record.data() {
            RData::HTTPS(HTTPS(svcb)) | RData::SVCB(svcb) => svcb.svc_params().to_vec(),
            other => panic!("unexpected rdata {:?}", other),
        }
    }

    #[test]
    fn test_key_codes() {
        assert_eq!(key_code("ALPN"), Some(1));
        assert_eq!(key_code("dohpath"), Some(7));
        assert_eq!(key_code("key65001"), Some(65001));
        assert_eq!(key_code("65002"), Some(65002));
        assert_eq!(key_code("ech-config"), None);
        assert_eq!(key_code("key70000"), None);
    }

    #[test]
    fn test_https_params_sorted_and_typed() {
        let records = encode(
            r#"[{"priority": 1, "target": ".", "params": {
                "port": "8443",
                "alpn": "h2,h3",
                "ipv4hint": "192.0.2.1, 192.0.2.2",
                "key65001": "opaque"
            }}]"#,
            SubRecordKind::HTTPS,
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        let params = params(&records[0]);
        let keys: Vec<u16> = params.iter().map(|(k, _)| u16::from(*k)).collect();
        assert_eq!(keys, vec![1, 3, 4, 65001]);
        assert_eq!(
            params[0].1,
            SvcParamValue::Alpn(Alpn(vec!["h2".into(), "h3".into()]))
        );
        assert_eq!(params[1].1, SvcParamValue::Port(8443));
        assert_eq!(
            params[3].1,
            SvcParamValue::Unknown(Unknown(b"opaque".to_vec()))
        );
    }

    #[test]
    fn test_unregistered_named_keys_use_private_codes() {
        let records = encode(
            r#"[{"priority": 1, "target": "svc.example.com", "params": {
                "ech": "abc",
                "bogus": "1",
                "key65280": "taken",
                "no-default-alpn": ""
            }}]"#,
            SubRecordKind::SVCB,
        )
        .unwrap();

        let params = params(&records[0]);
        let keys: Vec<u16> = params.iter().map(|(k, _)| u16::from(*k)).collect();
        assert_eq!(keys, vec![2, 65280, 65281, 65282]);
        assert_eq!(params[0].1, SvcParamValue::NoDefaultAlpn);
        assert_eq!(params[1].1, SvcParamValue::Unknown(Unknown(b"taken".to_vec())));
        assert_eq!(params[2].1, SvcParamValue::Unknown(Unknown(b"1".to_vec())));
        assert_eq!(params[3].1, SvcParamValue::Unknown(Unknown(b"abc".to_vec())));
        assert!(matches!(records[0].data(), RData::SVCB(_)));
    }

    #[test]
    fn test_dohpath_carried_verbatim() {
        let records = encode(
            r#"[{"priority": 1, "target": "dns.example.com", "params": {"alpn": "h2", "dohpath": "/dns-query{?dns}"}}]"#,
            SubRecordKind::SVCB,
        )
        .unwrap();

        let params = params(&records[0]);
        assert_eq!(u16::from(params[1].0), 7);
        assert_eq!(
            params[1].1,
            SvcParamValue::Unknown(Unknown(b"/dns-query{?dns}".to_vec()))
        );
    }

    #[test]
    fn test_invalid_port_fails() {
        let err = encode(
            r#"[{"priority": 1, "target": ".", "params": {"port": "https"}}]"#,
            SubRecordKind::HTTPS,
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::InvalidRecordValue { .. }));
    }
}
