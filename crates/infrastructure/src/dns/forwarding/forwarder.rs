use super::message_builder::MessageBuilder;
use super::response_parser::{ResponseParser, UpstreamResponse};
use crate::dns::transport::UdpTransport;
use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use kvdns_application::ports::{Handler, ResponseWriter, ServeError, ZoneQuery, ZoneResponse};
use kvdns_domain::{ConfigError, DomainError, UpstreamConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, warn};

pub const FORWARDER_NAME: &str = "forward";

/// Next handler that relays queries to upstream resolvers over UDP.
///
/// Servers are tried in configuration order. A server that times out, fails
/// or answers SERVFAIL/REFUSED/NOTIMP is skipped in favour of the next one;
/// the last server's error answer is relayed as is.
pub struct UpstreamForwarder {
    transports: Vec<UdpTransport>,
    timeout: Duration,
}

impl UpstreamForwarder {
    pub fn new(servers: Vec<SocketAddr>, timeout: Duration) -> Self {
        Self {
            transports: servers.into_iter().map(UdpTransport::new).collect(),
            timeout,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            config.socket_addrs()?,
            Duration::from_millis(config.timeout),
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.transports.is_empty()
    }

    async fn forward(&self, query: &ZoneQuery) -> Result<UpstreamResponse, DomainError> {
        let (id, request) = MessageBuilder::build_query(&query.name, query.query_type)?;
        let mut last_error =
            DomainError::NextHandlerFailed("no upstream servers configured".to_string());

        for (i, transport) in self.transports.iter().enumerate() {
            let is_last = i + 1 == self.transports.len();

            let response = match transport.send(&request, self.timeout).await {
                Ok(bytes) => ResponseParser::parse(&bytes),
                Err(e) => Err(e),
            };

            match response {
                Ok(response) if response.id != id => {
                    warn!(server = %transport.server_addr(), "Upstream answered with a different ID");
                    last_error = DomainError::NextHandlerFailed(format!(
                        "ID mismatch from {}",
                        transport.server_addr()
                    ));
                }
                Ok(response) if response.is_server_error() && !is_last => {
                    debug!(
                        server = %transport.server_addr(),
                        rcode = ?response.rcode,
                        "Upstream error response, trying next server"
                    );
                }
                Ok(response) => return Ok(response),
                Err(e) => {
                    warn!(server = %transport.server_addr(), error = %e, "Upstream query failed");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

#[async_trait]
impl Handler for UpstreamForwarder {
    fn name(&self) -> &'static str {
        FORWARDER_NAME
    }

    async fn serve(
        &self,
        query: &ZoneQuery,
        writer: &mut dyn ResponseWriter,
    ) -> Result<ResponseCode, ServeError> {
        debug!(name = %query.name, qtype = %query.query_type, "Forwarding query upstream");

        match self.forward(query).await {
            Ok(upstream) => {
                let mut response = ZoneResponse::with_code(query, upstream.rcode);
                response.recursion_available = upstream.recursion_available;
                response.answers = upstream.answers;
                response.authority = upstream.authority;

                writer
                    .write(response)
                    .map_err(|e| ServeError::new(ResponseCode::ServFail, e))?;
                Ok(upstream.rcode)
            }
            Err(e) => {
                let mut response = ZoneResponse::with_code(query, ResponseCode::ServFail);
                response.recursion_available = true;

                writer
                    .write(response)
                    .map_err(|write_err| ServeError::new(ResponseCode::ServFail, write_err))?;
                Err(ServeError::new(ResponseCode::ServFail, e))
            }
        }
    }
}
