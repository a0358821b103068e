use crate::ports::{Handler, ResponseCapture, ServeError, ZoneQuery};
use hickory_proto::rr::{Record, RecordType};
use kvdns_domain::DomainError;

/// A question asked of the next handler on behalf of another query, with the
/// answer captured instead of sent to the client.
#[derive(Debug, Clone)]
pub struct SubQuery {
    query: ZoneQuery,
}

impl SubQuery {
    pub fn new(parent: &ZoneQuery, name: &str, query_type: RecordType) -> Self {
        Self {
            query: ZoneQuery::new(parent.id, name, query_type),
        }
    }

    pub fn query(&self) -> &ZoneQuery {
        &self.query
    }

    /// Runs the sub-query and returns the answer section of the reply.
    pub async fn resolve(&self, next: &dyn Handler) -> Result<Vec<Record>, ServeError> {
        let mut capture = ResponseCapture::new();
        let rcode = next.serve(&self.query, &mut capture).await?;

        match capture.into_response() {
            Some(response) => Ok(response.answers),
            None => Err(ServeError::new(
                rcode,
                DomainError::NextHandlerFailed(format!(
                    "{} wrote no response for {}",
                    next.name(),
                    self.query.name
                )),
            )),
        }
    }
}
