//! # Tidemark
//!
//! Schema compiler and migration engine for SQLite, MySQL and PostgreSQL.
//!
//! - [`schema`] describes table changes once and compiles them to
//!   dialect-specific DDL
//! - [`migration`] applies and reverts registered migrations in batches,
//!   each batch inside one transaction
//! - [`Executor`] is the seam between the engine and a database driver;
//!   [`connect`] provides one for PostgreSQL via `may_postgres`, and for
//!   SQLite and MySQL via `sqlx` behind the `sqlite` and `mysql` features

pub mod config;
pub mod connection;
pub mod dialect;
pub mod dsn;
pub mod executor;
pub mod migration;
pub mod schema;
#[cfg(any(feature = "sqlite", feature = "mysql"))]
pub mod sqlx_executor;
pub mod transaction;

#[cfg(feature = "tracing")]
mod tracing_helpers;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use config::DatabaseConfig;
pub use connection::{connect, ConnectionError};
pub use dialect::{Dialect, DialectError};
pub use dsn::{DataSource, DsnError};
pub use executor::{ExecError, Executor, MayPostgresExecutor, Row, Value};
#[cfg(feature = "mysql")]
pub use sqlx_executor::MySqlExecutor;
#[cfg(feature = "sqlite")]
pub use sqlx_executor::SqliteExecutor;
pub use transaction::Transaction;
