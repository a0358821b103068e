use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::{Record, RecordType};
use kvdns_domain::DomainError;

/// A question handed to a handler by its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneQuery {
    pub id: u16,
    /// Fully qualified, as received (case preserved).
    pub name: String,
    pub query_type: RecordType,
    pub recursion_desired: bool,
}

impl ZoneQuery {
    pub fn new(id: u16, name: impl Into<String>, query_type: RecordType) -> Self {
        Self {
            id,
            name: kvdns_domain::fqdn(&name.into()),
            query_type,
            recursion_desired: true,
        }
    }
}

/// A complete DNS answer for one [`ZoneQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneResponse {
    pub id: u16,
    pub name: String,
    pub query_type: RecordType,
    pub response_code: ResponseCode,
    pub authoritative: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub answers: Vec<Record>,
    pub authority: Vec<Record>,
    pub additionals: Vec<Record>,
}

impl ZoneResponse {
    /// Empty NOERROR reply to `query`.
    pub fn reply(query: &ZoneQuery) -> Self {
        Self {
            id: query.id,
            name: query.name.clone(),
            query_type: query.query_type,
            response_code: ResponseCode::NoError,
            authoritative: false,
            recursion_desired: query.recursion_desired,
            recursion_available: false,
            answers: Vec::new(),
            authority: Vec::new(),
            additionals: Vec::new(),
        }
    }

    pub fn with_code(query: &ZoneQuery, response_code: ResponseCode) -> Self {
        Self {
            response_code,
            ..Self::reply(query)
        }
    }
}

/// Sink for the single message a handler produces per query.
pub trait ResponseWriter: Send {
    fn write(&mut self, response: ZoneResponse) -> Result<(), DomainError>;
}

/// Writer that keeps the response in memory, for hosts that encode it later and
/// for sub-queries whose answers are merged into another response.
#[derive(Debug, Default)]
pub struct ResponseCapture {
    response: Option<ZoneResponse>,
}

impl ResponseCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn response(&self) -> Option<&ZoneResponse> {
        self.response.as_ref()
    }

    pub fn into_response(self) -> Option<ZoneResponse> {
        self.response
    }
}

impl ResponseWriter for ResponseCapture {
    fn write(&mut self, response: ZoneResponse) -> Result<(), DomainError> {
        self.response = Some(response);
        Ok(())
    }
}

/// Failure of a handler after it has written (or tried to write) its reply.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{rcode:?}: {source}")]
pub struct ServeError {
    pub rcode: ResponseCode,
    pub source: DomainError,
}

impl ServeError {
    pub fn new(rcode: ResponseCode, source: DomainError) -> Self {
        Self { rcode, source }
    }
}

/// One link of a handler chain.
#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &'static str;

    async fn serve(
        &self,
        query: &ZoneQuery,
        writer: &mut dyn ResponseWriter,
    ) -> Result<ResponseCode, ServeError>;
}
