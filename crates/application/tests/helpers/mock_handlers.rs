use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::{Name, RData, Record};
use kvdns_application::ports::{Handler, ResponseWriter, ServeError, ZoneQuery, ZoneResponse};
use kvdns_domain::DomainError;
use std::sync::{Arc, Mutex};

/// Next handler that answers every query with the same records and records
/// the questions it was asked.
#[derive(Clone)]
pub struct ScriptedHandler {
    answers: Arc<Mutex<Vec<RData>>>,
    rcode: Arc<Mutex<ResponseCode>>,
    failure: Arc<Mutex<Option<DomainError>>>,
    queries: Arc<Mutex<Vec<ZoneQuery>>>,
}

impl ScriptedHandler {
    pub fn new() -> Self {
        Self {
            answers: Arc::new(Mutex::new(Vec::new())),
            rcode: Arc::new(Mutex::new(ResponseCode::NoError)),
            failure: Arc::new(Mutex::new(None)),
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn answering(rdata: Vec<RData>) -> Self {
        let handler = Self::new();
        *handler.answers.lock().unwrap() = rdata;
        handler
    }

    pub fn with_rcode(self, rcode: ResponseCode) -> Self {
        *self.rcode.lock().unwrap() = rcode;
        self
    }

    pub fn failing(error: DomainError) -> Self {
        let handler = Self::new();
        *handler.failure.lock().unwrap() = Some(error);
        handler
    }

    pub fn queries(&self) -> Vec<ZoneQuery> {
        self.queries.lock().unwrap().clone()
    }
}

impl Default for ScriptedHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Handler for ScriptedHandler {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn serve(
        &self,
        query: &ZoneQuery,
        writer: &mut dyn ResponseWriter,
    ) -> Result<ResponseCode, ServeError> {
        self.queries.lock().unwrap().push(query.clone());

        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(ServeError::new(ResponseCode::ServFail, error));
        }

        let rcode = *self.rcode.lock().unwrap();
        let owner: Name = query.name.parse().unwrap();
        let mut response = ZoneResponse::with_code(query, rcode);
        response.answers = self
            .answers
            .lock()
            .unwrap()
            .iter()
            .cloned()
            .map(|rdata| Record::from_rdata(owner.clone(), 300, rdata))
            .collect();

        writer.write(response).map_err(|e| ServeError::new(ResponseCode::ServFail, e))?;
        Ok(rcode)
    }
}
