//! Migration Engine
//!
//! This module provides:
//! - the [`Migration`] trait and the closure-based [`FnMigration`]
//! - [`SchemaManager`], the handle migrations use to change the schema
//! - [`Migrator`], which applies and reverts migrations in batches and records
//!   them in the `schema_migrations` table
//! - migration file scaffolding for the CLI
//!
//! # Example
//!
//! ```rust,no_run
//! use tidemark::migration::{Migration, MigrationError, SchemaManager};
//!
//! pub struct CreateUsersTable;
//!
//! impl Migration for CreateUsersTable {
//!     fn version(&self) -> &str {
//!         "20240120120000"
//!     }
//!
//!     fn name(&self) -> &str {
//!         "create_users_table"
//!     }
//!
//!     fn up(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
//!         manager.create_table("users", |t| {
//!             t.increments("id").primary();
//!             t.string("email", 255).unique();
//!             Ok(())
//!         })
//!     }
//!
//!     fn down(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
//!         manager.drop_table("users")
//!     }
//! }
//! ```

pub mod error;
pub mod file;
pub mod migration;
pub mod migrator;
pub mod record;
mod registry;
pub mod schema_manager;
pub mod state_table;
pub mod status;

pub use error::{ErrorKind, MigrationError};
pub use file::{create_migration_file, MigrationFile};
pub use migration::{FnMigration, Migration};
pub use migrator::Migrator;
pub use record::MigrationRecord;
pub use schema_manager::SchemaManager;
pub use state_table::initialize_state_table;
pub use status::{MigrationState, MigrationStatus};
