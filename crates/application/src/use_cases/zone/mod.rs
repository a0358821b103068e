//! Authoritative resolution of zone documents.

mod cname;
mod dispatcher;
mod encoders;
mod engine;
mod lookup;
mod soa_provider;
mod sub_query;

pub use engine::{ZoneEngine, ENGINE_NAME, MAX_CNAME_DEPTH};
pub use sub_query::SubQuery;
