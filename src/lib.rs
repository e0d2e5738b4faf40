//! AsterixDB Rust Client
//!
//! Async client for AsterixDB's SQL++ HTTP API: a chainable query builder,
//! injection-safe literal encoding, a bounded session pool with
//! retry-and-backoff, and lazy materialization of the engine's
//! self-describing documents into typed rows.
//!
//! # Query builder
//!
//! ```no_run
//! use asterix_client::{field, ConnectionBuilder, Order};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), asterix_client::ClientError> {
//!     let conn = ConnectionBuilder::new("http://localhost:19002")
//!         .dataverse("TinySocial")
//!         .build()?;
//!
//!     let rows = conn
//!         .dataset("Users")
//!         .select(["name", "email"])
//!         .filter(field("age").gt(30))
//!         .order_by("name", Order::Asc)
//!         .limit(10)
//!         .fetch()
//!         .await?;
//!
//!     for row in rows {
//!         println!("{:?} {:?}", row.get("name"), row.get("email"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Cursor interface
//!
//! ```no_run
//! use asterix_client::{ConnectionBuilder, Datum, Params};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), asterix_client::ClientError> {
//!     let conn = ConnectionBuilder::new("http://localhost:19002").build()?;
//!     let mut cursor = conn.cursor();
//!     cursor
//!         .execute(
//!             "SELECT name FROM Users WHERE age > ?",
//!             Params::Positional(vec![Datum::Int(30)]),
//!         )
//!         .await?;
//!     while let Some(row) = cursor.fetchone() {
//!         println!("{:?}", row.get("name"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
mod executor;
pub mod materialize;
pub mod pool;
pub mod protocol;
pub mod query;
pub mod value;

pub use client::{Connection, ConnectionBuilder, Cursor, DatasetQuery, Params};
pub use error::{ClientError, ClientResult};
pub use materialize::ResultSet;
pub use pool::{Pool, PoolConfig, PoolStats, PooledSession, RetryPolicy};
pub use protocol::{EngineDiagnostic, QueryRequest, QueryResponse};
pub use query::{
    bind_positional, encode, field, render, Aggregate, CompareOp, DatasetDescriptor, Field,
    FieldDef, JoinClause, JoinKind, Order, Predicate, SelectDescriptor, Statement, TypeDescriptor,
    TypeTag,
};
pub use value::{Datum, ResultRow};
