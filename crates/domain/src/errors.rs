use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("KV store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Malformed zone document: {0}")]
    DecodeError(String),

    #[error("Invalid {record_type} value: {reason}")]
    InvalidRecordValue {
        record_type: &'static str,
        reason: String,
    },

    #[error("CNAME chain for {name} exceeds {limit} hops")]
    CnameDepthExceeded { name: String, limit: usize },

    #[error("No next handler configured after {0}")]
    NoNextHandler(&'static str),

    #[error("Next handler failed: {0}")]
    NextHandlerFailed(String),

    #[error("Failed to write DNS response: {0}")]
    WriteFailure(String),

    #[error("Query timeout")]
    QueryTimeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DomainError {
    pub fn invalid_value(record_type: &'static str, reason: impl Into<String>) -> Self {
        DomainError::InvalidRecordValue {
            record_type,
            reason: reason.into(),
        }
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::InvalidDomainName(_) => "INVALID_NAME",
            DomainError::StoreUnavailable(_) => "KV_GET",
            DomainError::DecodeError(_) => "JSON_UNMARSHAL",
            DomainError::InvalidRecordValue { .. } => "INVALID_VALUE",
            DomainError::CnameDepthExceeded { .. } => "CNAME_DEPTH",
            DomainError::NoNextHandler(_) => "NO_NEXT",
            DomainError::NextHandlerFailed(_) => "NEXT_FAILED",
            DomainError::WriteFailure(_) => "WRITE_MSG",
            DomainError::QueryTimeout => "TIMEOUT",
            DomainError::ConfigError(_) => "CONFIG",
        }
    }
}
