use hickory_proto::rr::rdata::TXT;
use hickory_proto::rr::{Name, RData, Record};
use kvdns_domain::{DomainError, SubRecord};
use serde::Deserialize;

/// A TXT element is either one string or a list of character-strings that
/// belong to the same record (long SPF or DKIM values).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TxtEntry {
    Single(String),
    Segments(Vec<String>),
}

impl TxtEntry {
    fn into_strings(self) -> Vec<String> {
        match self {
            TxtEntry::Single(s) => vec![s],
            TxtEntry::Segments(segments) => segments,
        }
    }
}

const MAX_STRING_LEN: usize = 255;

/// Encodes TXT entries. Strings longer than a character-string allows are cut
/// into consecutive 255-byte character-strings of the same record.
pub(crate) fn append_txt(
    section: &mut Vec<Record>,
    owner: &Name,
    ttl: u32,
    sub: &SubRecord,
) -> Result<usize, DomainError> {
    let entries: Vec<TxtEntry> = sub.decode_value("TXT")?;
    let mut appended = 0;

    for strings in entries.into_iter().map(TxtEntry::into_strings) {
        if strings.is_empty() {
            continue;
        }
        let mut chunks: Vec<&[u8]> = Vec::with_capacity(strings.len());
        for bytes in strings.iter().map(String::as_bytes) {
            if bytes.is_empty() {
                chunks.push(bytes);
            }
            chunks.extend(bytes.chunks(MAX_STRING_LEN));
        }

        section.push(Record::from_rdata(
            owner.clone(),
            ttl,
            RData::TXT(TXT::from_bytes(chunks)),
        ));
        appended += 1;
    }

    Ok(appended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::zone::encoders::owner_name;
    use kvdns_domain::ZoneRecord;

    #[test]
    fn test_single_and_segmented_entries() {
        let doc = br#"{"records": [{"type": "TXT", "value": [
            "v=spf1 -all",
            ["part one", "part two"],
            []
        ]}]}"#;
        let record = ZoneRecord::decode(doc).unwrap();
        let owner = owner_name("example.com").unwrap();
        let mut section = Vec::new();

        let n = append_txt(&mut section, &owner, 60, &record.records[0]).unwrap();

        assert_eq!(n, 2);
        match section[1].data() {
            RData::TXT(txt) => assert_eq!(txt.txt_data().len(), 2),
            other => panic!("unexpected rdata {:?}", other),
        }
    }

    #[test]
    fn test_long_string_split_into_character_strings() {
        let long = format!("{}{}", "a".repeat(255), "b".repeat(45));
        let doc = format!(r#"{{"records": [{{"type": "TXT", "value": ["{}"]}}]}}"#, long);
        let record = ZoneRecord::decode(doc.as_bytes()).unwrap();
        let owner = owner_name("example.com").unwrap();
        let mut section = Vec::new();

        let n = append_txt(&mut section, &owner, 60, &record.records[0]).unwrap();

        assert_eq!(n, 1);
        match section[0].data() {
            RData::TXT(txt) => {
                let parts = txt.txt_data();
                assert_eq!(parts.len(), 2);
                assert_eq!(&*parts[0], "a".repeat(255).as_bytes());
                assert_eq!(&*parts[1], "b".repeat(45).as_bytes());
            }
            other => panic!("unexpected rdata {:?}", other),
        }
    }
}
