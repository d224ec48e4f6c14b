//! Database Layer
//!
//! Everything between the GraphQL resolvers and PostgreSQL.
//!
//! ## Module Structure
//!
//! - `connection.rs` - Locating and parsing the connection string into a `ConnectionConfig`
//! - `connector.rs` - Opening single connections and running queries on them
//! - `acquire.rs` - Pooled or per-request acquisition with guaranteed release
//! - `schema.rs` - Idempotent table and index creation at start-up
//! - `health.rs` - Connectivity probe
//! - `traits.rs` - `DatabaseResource` trait implemented by each record kind
//! - `values.rs` - `DatabaseValue`, the one parameter type every query binds
//! - `filters.rs` - `WHERE`/`LIMIT`/`OFFSET` builder for list queries
//! - `error.rs` - `DatabaseError`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use crate::database::{Database, DatabaseSettings, DatabaseMode, PgConnector};
//! use crate::models::feedback::Feedback;
//!
//! let db = Database::new(DatabaseSettings::new(url, DatabaseMode::Pooled), PgConnector);
//! db.ensure_schema().await;
//!
//! let feedback = db
//!     .with_connection(|conn| Box::pin(async move { Feedback::find_one(conn, id).await }))
//!     .await?;
//! ```
//!
//! Connections never outlive the closure passed to `with_connection`; in
//! per-request mode that is also when they are closed.

pub mod acquire;
pub mod connection;
pub mod connector;
pub mod error;
pub mod filters;
pub mod health;
pub mod schema;
pub mod traits;
pub mod values;

#[cfg(test)]
pub mod testing;

pub use acquire::{Database, DatabaseMode, DatabaseSettings};
pub use connector::PgConnector;
pub use error::DatabaseError;

/// The production database handle.
pub type Db = Database<PgConnector>;
