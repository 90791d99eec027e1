//! Migration trait definition

use super::error::MigrationError;
use super::schema_manager::SchemaManager;

/// Trait that all migrations must implement
///
/// A migration is identified by its version, a sortable timestamp string such
/// as `20240120120000`. Versions are compared lexicographically, so keep them
/// the same width.
///
/// Migrations run synchronously inside the transaction opened by
/// [`Migrator::up`](super::Migrator::up) or [`Migrator::down`](super::Migrator::down).
pub trait Migration: Send + Sync {
    /// Migration version (timestamp: YYYYMMDDHHMMSS)
    fn version(&self) -> &str;

    /// Human-readable name. Defaults to the version.
    fn name(&self) -> &str {
        self.version()
    }

    /// Apply the migration.
    ///
    /// # Errors
    ///
    /// Any error aborts and rolls back the whole batch.
    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError>;

    /// Revert the migration.
    ///
    /// # Errors
    ///
    /// Any error aborts and rolls back the whole batch.
    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError>;
}

type Step = Box<dyn Fn(&SchemaManager<'_>) -> Result<(), MigrationError> + Send + Sync>;

/// A [`Migration`] built from a pair of closures.
///
/// ```
/// use tidemark::migration::FnMigration;
///
/// let migration = FnMigration::new(
///     "20240101000000",
///     |m| m.create_table("users", |t| {
///         t.increments("id").primary();
///         Ok(())
///     }),
///     |m| m.drop_table("users"),
/// )
/// .with_name("create_users");
/// ```
pub struct FnMigration {
    version: String,
    name: Option<String>,
    up: Step,
    down: Step,
}

impl FnMigration {
    pub fn new<U, D>(version: impl Into<String>, up: U, down: D) -> Self
    where
        U: Fn(&SchemaManager<'_>) -> Result<(), MigrationError> + Send + Sync + 'static,
        D: Fn(&SchemaManager<'_>) -> Result<(), MigrationError> + Send + Sync + 'static,
    {
        Self {
            version: version.into(),
            name: None,
            up: Box::new(up),
            down: Box::new(down),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Migration for FnMigration {
    fn version(&self) -> &str {
        &self.version
    }

    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.version)
    }

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        (self.up)(manager)
    }

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
        (self.down)(manager)
    }
}

impl std::fmt::Debug for FnMigration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMigration")
            .field("version", &self.version)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
