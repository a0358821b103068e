//! Conversion between wire-format DNS messages and handler queries/responses.

use crate::dns::forwarding::MessageBuilder;
use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use kvdns_application::ports::{ZoneQuery, ZoneResponse};
use kvdns_domain::DomainError;

/// Classic DNS payload limit for clients that did not advertise EDNS(0).
pub const DEFAULT_UDP_PAYLOAD: usize = 512;

/// Upper bound applied to advertised EDNS(0) payload sizes.
pub const MAX_UDP_PAYLOAD: usize = 4096;

pub fn parse_request(bytes: &[u8]) -> Result<Message, DomainError> {
    let message = Message::from_vec(bytes)
        .map_err(|e| DomainError::InvalidDomainName(format!("Malformed DNS query: {}", e)))?;

    if message.message_type() != MessageType::Query {
        return Err(DomainError::InvalidDomainName(
            "Message is not a query".to_string(),
        ));
    }
    Ok(message)
}

/// The first question of a standard query, or `None` for other opcodes and
/// empty question sections.
pub fn zone_query(request: &Message) -> Option<ZoneQuery> {
    if request.op_code() != OpCode::Query {
        return None;
    }

    let question = request.queries().first()?;
    let mut query = ZoneQuery::new(
        request.id(),
        question.name().to_string(),
        question.query_type(),
    );
    query.recursion_desired = request.recursion_desired();
    Some(query)
}

pub fn encode_response(request: &Message, response: &ZoneResponse) -> Result<Vec<u8>, DomainError> {
    let mut message = reply_to(request, response.response_code);
    message.set_authoritative(response.authoritative);
    message.set_recursion_available(response.recursion_available);
    message.add_answers(response.answers.iter().cloned());
    message.add_name_servers(response.authority.iter().cloned());
    message.add_additionals(response.additionals.iter().cloned());

    MessageBuilder::serialize_message(&message)
}

/// Empty reply carrying only the question and `rcode`.
pub fn error_response(request: &Message, rcode: ResponseCode) -> Result<Vec<u8>, DomainError> {
    let mut message = reply_to(request, rcode);
    message.set_recursion_available(rcode == ResponseCode::ServFail);
    MessageBuilder::serialize_message(&message)
}

/// Header-only reply with the TC bit set, telling the client to retry over TCP.
pub fn truncated_response(request: &Message, response: &ZoneResponse) -> Result<Vec<u8>, DomainError> {
    let mut message = reply_to(request, response.response_code);
    message.set_authoritative(response.authoritative);
    message.set_recursion_available(response.recursion_available);
    message.set_truncated(true);
    MessageBuilder::serialize_message(&message)
}

/// FORMERR for a buffer that could not be parsed at all. Only the header is
/// echoed; `None` when even the header is incomplete.
pub fn format_error(raw: &[u8]) -> Option<Vec<u8>> {
    if raw.len() < 12 {
        return None;
    }

    let mut buf = vec![0u8; 12];
    buf[0] = raw[0];
    buf[1] = raw[1];
    // QR plus the request opcode and RD bit
    buf[2] = 0x80 | (raw[2] & 0x79);
    buf[3] = ResponseCode::FormErr.low();
    Some(buf)
}

fn reply_to(request: &Message, rcode: ResponseCode) -> Message {
    let mut message = Message::new(request.id(), MessageType::Response, request.op_code());
    message.set_recursion_desired(request.recursion_desired());
    message.set_response_code(rcode);
    for query in request.queries() {
        message.add_query(query.clone());
    }
    message
}

/// UDP payload size the client accepts: its EDNS(0) advertisement clamped to
/// [`DEFAULT_UDP_PAYLOAD`, `MAX_UDP_PAYLOAD`], or the classic 512 bytes.
///
/// Reads the raw buffer so that no second parse is needed. Unexpected
/// layouts (compressed question names, short buffers) fall back to 512.
pub fn udp_payload_limit(buf: &[u8]) -> usize {
    if buf.len() < 12 {
        return DEFAULT_UDP_PAYLOAD;
    }

    let qdcount = u16::from_be_bytes([buf[4], buf[5]]);
    let ancount = u16::from_be_bytes([buf[6], buf[7]]);
    let nscount = u16::from_be_bytes([buf[8], buf[9]]);
    let arcount = u16::from_be_bytes([buf[10], buf[11]]);

    if arcount == 0 || ancount != 0 || nscount != 0 {
        return DEFAULT_UDP_PAYLOAD;
    }

    let mut pos = 12;
    for _ in 0..qdcount {
        match skip_name(buf, pos) {
            Some(end) => pos = end + 4,
            None => return DEFAULT_UDP_PAYLOAD,
        }
    }

    for _ in 0..arcount {
        let Some(end) = skip_name(buf, pos) else {
            return DEFAULT_UDP_PAYLOAD;
        };
        pos = end;
        if pos + 10 > buf.len() {
            return DEFAULT_UDP_PAYLOAD;
        }

        let rr_type = u16::from_be_bytes([buf[pos], buf[pos + 1]]);
        if rr_type == 41 {
            let size = u16::from_be_bytes([buf[pos + 2], buf[pos + 3]]) as usize;
            return size.clamp(DEFAULT_UDP_PAYLOAD, MAX_UDP_PAYLOAD);
        }

        let rdlen = u16::from_be_bytes([buf[pos + 8], buf[pos + 9]]) as usize;
        pos += 10 + rdlen;
    }

    DEFAULT_UDP_PAYLOAD
}

fn skip_name(buf: &[u8], mut pos: usize) -> Option<usize> {
    loop {
        let label_len = *buf.get(pos)? as usize;
        if label_len == 0 {
            return Some(pos + 1);
        }
        if label_len & 0xC0 != 0 {
            return None;
        }
        pos += 1 + label_len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hickory_proto::rr::RecordType;

    fn a_query(id: u16, name: &str) -> Vec<u8> {
        let (_, mut bytes) = MessageBuilder::build_query(name, RecordType::A).unwrap();
        bytes[0..2].copy_from_slice(&id.to_be_bytes());
        bytes
    }

    fn with_opt(mut bytes: Vec<u8>, size: u16) -> Vec<u8> {
        bytes[11] = 1;
        bytes.extend_from_slice(&[0x00, 0x00, 0x29]);
        bytes.extend_from_slice(&size.to_be_bytes());
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
        bytes
    }

    #[test]
    fn test_zone_query_from_request() {
        let request = parse_request(&a_query(99, "www.example.com.")).unwrap();
        let query = zone_query(&request).unwrap();

        assert_eq!(query.id, 99);
        assert_eq!(query.name, "www.example.com.");
        assert_eq!(query.query_type, RecordType::A);
        assert!(query.recursion_desired);
    }

    #[test]
    fn test_encoded_response_echoes_question() {
        let request = parse_request(&a_query(7, "example.com.")).unwrap();
        let query = zone_query(&request).unwrap();
        let mut response = ZoneResponse::with_code(&query, ResponseCode::NXDomain);
        response.authoritative = true;

        let bytes = encode_response(&request, &response).unwrap();
        let decoded = Message::from_vec(&bytes).unwrap();

        assert_eq!(decoded.id(), 7);
        assert_eq!(decoded.message_type(), MessageType::Response);
        assert_eq!(decoded.response_code(), ResponseCode::NXDomain);
        assert!(decoded.authoritative());
        assert_eq!(decoded.queries().len(), 1);
    }

    #[test]
    fn test_format_error_from_garbage_header() {
        let raw = [0xAB, 0xCD, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0, 0xFF];
        let reply = format_error(&raw).unwrap();

        assert_eq!(&reply[0..2], &[0xAB, 0xCD]);
        assert_eq!(reply[2] & 0x80, 0x80);
        assert_eq!(reply[3] & 0x0F, 1);
        assert!(format_error(&[0x01]).is_none());
    }

    #[test]
    fn test_udp_payload_limit() {
        let plain = a_query(1, "example.com.");
        assert_eq!(udp_payload_limit(&plain), 512);
        assert_eq!(udp_payload_limit(&with_opt(plain.clone(), 1232)), 1232);
        assert_eq!(udp_payload_limit(&with_opt(plain.clone(), 100)), 512);
        assert_eq!(udp_payload_limit(&with_opt(plain, 65000)), 4096);
    }
}
