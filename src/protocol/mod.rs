//! Wire types for the SQL++ HTTP API.

mod request;
mod response;

pub use request::QueryRequest;
pub use response::{EngineDiagnostic, QueryResponse};
