use hickory_proto::op::{Message, ResponseCode};
use hickory_proto::rr::Record;
use kvdns_domain::DomainError;
use tracing::debug;

/// The parts of an upstream reply that are copied into the client response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub id: u16,

    pub rcode: ResponseCode,

    pub truncated: bool,

    pub answers: Vec<Record>,

    pub authority: Vec<Record>,

    pub recursion_available: bool,
}

impl UpstreamResponse {
    /// SERVFAIL, REFUSED and NOTIMP make the forwarder try the next server.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self.rcode,
            ResponseCode::ServFail | ResponseCode::Refused | ResponseCode::NotImp
        )
    }
}

pub struct ResponseParser;

impl ResponseParser {
    pub fn parse(response_bytes: &[u8]) -> Result<UpstreamResponse, DomainError> {
        let message = Message::from_vec(response_bytes).map_err(|e| {
            DomainError::NextHandlerFailed(format!("Failed to parse DNS response: {}", e))
        })?;

        let response = UpstreamResponse {
            id: message.id(),
            rcode: message.response_code(),
            truncated: message.truncated(),
            answers: message.answers().to_vec(),
            authority: message.name_servers().to_vec(),
            recursion_available: message.recursion_available(),
        };

        debug!(
            rcode = ?response.rcode,
            answers = response.answers.len(),
            authority = response.authority.len(),
            truncated = response.truncated,
            "Upstream response parsed"
        );

        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::forwarding::MessageBuilder;
    use hickory_proto::op::{MessageType, OpCode};
    use hickory_proto::rr::rdata::A;
    use hickory_proto::rr::{Name, RData};
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    #[test]
    fn test_parse_copies_sections() {
        let mut message = Message::new(7, MessageType::Response, OpCode::Query);
        message.set_response_code(ResponseCode::NoError);
        message.add_answer(Record::from_rdata(
            Name::from_str("cdn.example.net.").unwrap(),
            60,
            RData::A(A(Ipv4Addr::new(192, 0, 2, 1))),
        ));
        let bytes = MessageBuilder::serialize_message(&message).unwrap();

        let parsed = ResponseParser::parse(&bytes).unwrap();

        assert_eq!(parsed.id, 7);
        assert_eq!(parsed.answers.len(), 1);
        assert!(parsed.authority.is_empty());
        assert!(!parsed.is_server_error());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(ResponseParser::parse(&[0x01, 0x02]).is_err());
    }
}
