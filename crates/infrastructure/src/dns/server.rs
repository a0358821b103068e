use crate::dns::wire;
use hickory_proto::op::{Header, ResponseCode};
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use kvdns_application::ports::{Handler, ResponseCapture, ZoneQuery, ZoneResponse};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Host side of the handler chain: turns DNS requests into [`ZoneQuery`]s,
/// runs them under the query timeout and sends back whatever the chain wrote.
#[derive(Clone)]
pub struct DnsServerHandler {
    handler: Arc<dyn Handler>,
    timeout: Duration,
}

impl DnsServerHandler {
    pub fn new(handler: Arc<dyn Handler>, timeout: Duration) -> Self {
        Self { handler, timeout }
    }

    /// Runs `query` through the chain. A timeout, or a chain that writes
    /// nothing, yields SERVFAIL.
    pub async fn resolve(&self, query: &ZoneQuery) -> ZoneResponse {
        let mut capture = ResponseCapture::new();

        match tokio::time::timeout(self.timeout, self.handler.serve(query, &mut capture)).await {
            Ok(Ok(rcode)) => {
                debug!(name = %query.name, qtype = %query.query_type, rcode = ?rcode, "Query served");
            }
            Ok(Err(e)) => {
                debug!(name = %query.name, qtype = %query.query_type, error = %e, "Query served with error");
            }
            Err(_) => {
                warn!(name = %query.name, qtype = %query.query_type, "Query timed out");
                return servfail(query);
            }
        }

        capture.into_response().unwrap_or_else(|| {
            error!(name = %query.name, handler = self.handler.name(), "Handler wrote no response");
            servfail(query)
        })
    }

    /// Wire-in, wire-out path used by the UDP listener. Replies that exceed
    /// the client's payload limit are sent truncated. Returns `None` when
    /// nothing should be sent back.
    pub async fn handle_raw(&self, query_buf: &[u8]) -> Option<Vec<u8>> {
        let request = match wire::parse_request(query_buf) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Unparsable DNS query");
                return wire::format_error(query_buf);
            }
        };

        let Some(query) = wire::zone_query(&request) else {
            return encode_or_log(wire::error_response(&request, ResponseCode::NotImp));
        };

        let response = self.resolve(&query).await;
        let encoded = encode_or_log(wire::encode_response(&request, &response))?;

        if encoded.len() > wire::udp_payload_limit(query_buf) {
            debug!(name = %query.name, size = encoded.len(), "Response truncated for UDP");
            return encode_or_log(wire::truncated_response(&request, &response));
        }
        Some(encoded)
    }
}

#[async_trait::async_trait]
impl RequestHandler for DnsServerHandler {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> ResponseInfo {
        let request_info = match request.request_info() {
            Ok(info) => info,
            Err(e) => {
                error!(error = %e, "Failed to parse request info");
                return send_error_response(request, &mut response_handle, ResponseCode::FormErr)
                    .await;
            }
        };

        let mut query = ZoneQuery::new(
            request.header().id(),
            request_info.query.name().to_string(),
            request_info.query.query_type(),
        );
        query.recursion_desired = request.header().recursion_desired();

        let response = self.resolve(&query).await;

        let builder = MessageResponseBuilder::from_message_request(request);
        let mut header = Header::response_from_request(request.header());
        header.set_response_code(response.response_code);
        header.set_authoritative(response.authoritative);
        header.set_recursion_available(response.recursion_available);
        let message = builder.build(
            header,
            response.answers.iter(),
            response.authority.iter(),
            &[],
            response.additionals.iter(),
        );

        match response_handle.send_response(message).await {
            Ok(info) => info,
            Err(e) => {
                error!(error = %e, "Failed to send response");
                ResponseInfo::from(*request.header())
            }
        }
    }
}

fn servfail(query: &ZoneQuery) -> ZoneResponse {
    let mut response = ZoneResponse::with_code(query, ResponseCode::ServFail);
    response.recursion_available = true;
    response
}

fn encode_or_log(result: Result<Vec<u8>, kvdns_domain::DomainError>) -> Option<Vec<u8>> {
    result
        .map_err(|e| error!(error = %e, "Failed to encode DNS response"))
        .ok()
}

async fn send_error_response<R: ResponseHandler>(
    request: &Request,
    response_handle: &mut R,
    code: ResponseCode,
) -> ResponseInfo {
    debug!(code = ?code, "Sending error response");
    let builder = MessageResponseBuilder::from_message_request(request);
    let mut header = Header::response_from_request(request.header());
    header.set_response_code(code);
    let response = builder.build(header, &[], &[], &[], &[]);

    match response_handle.send_response(response).await {
        Ok(info) => info,
        Err(e) => {
            error!(error = %e, "Failed to send error response");
            ResponseInfo::from(*request.header())
        }
    }
}
