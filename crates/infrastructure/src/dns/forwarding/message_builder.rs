//! Upstream query construction with `hickory-proto`.

use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{DNSClass, Name, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use kvdns_domain::DomainError;
use std::str::FromStr;

pub struct MessageBuilder;

impl MessageBuilder {
    /// Builds a recursive query for `domain` with a random ID and returns the
    /// ID together with the wire bytes.
    pub fn build_query(
        domain: &str,
        record_type: RecordType,
    ) -> Result<(u16, Vec<u8>), DomainError> {
        let name = Name::from_str(domain).map_err(|e| {
            DomainError::InvalidDomainName(format!("Invalid domain '{}': {}", domain, e))
        })?;

        let mut query = Query::new();
        query.set_name(name);
        query.set_query_type(record_type);
        query.set_query_class(DNSClass::IN);

        let id = fastrand::u16(..);
        let mut message = Message::new(id, MessageType::Query, OpCode::Query);
        message.set_recursion_desired(true);
        message.add_query(query);

        Ok((id, Self::serialize_message(&message)?))
    }

    pub(crate) fn serialize_message(message: &Message) -> Result<Vec<u8>, DomainError> {
        let mut buf = Vec::with_capacity(512);
        let mut encoder = BinEncoder::new(&mut buf);

        message.emit(&mut encoder).map_err(|e| {
            DomainError::WriteFailure(format!("Failed to serialize DNS message: {}", e))
        })?;

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_sets_rd_and_id() {
        let (id, bytes) = MessageBuilder::build_query("example.com.", RecordType::A).unwrap();

        assert!(bytes.len() >= 12);
        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), id);
        assert_eq!(bytes[2] & 0x01, 0x01, "RD flag should be set");
    }

    #[test]
    fn test_query_round_trips_question() {
        let (_, bytes) = MessageBuilder::build_query("cdn.example.net.", RecordType::AAAA).unwrap();
        let message = Message::from_vec(&bytes).unwrap();

        assert_eq!(message.queries().len(), 1);
        assert_eq!(message.queries()[0].name().to_string(), "cdn.example.net.");
        assert_eq!(message.queries()[0].query_type(), RecordType::AAAA);
    }
}
