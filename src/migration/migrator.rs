//! Migrator - Core migration execution engine

use super::error::MigrationError;
use super::migration::Migration;
use super::record::MigrationRecord;
use super::registry::Registry;
use super::schema_manager::SchemaManager;
use super::state_table;
use super::status::{MigrationState, MigrationStatus};
use crate::dialect::Dialect;
use crate::executor::Executor;
use crate::transaction::Transaction;
use std::collections::HashSet;
use std::time::Instant;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Core migration execution engine
///
/// Construct one `Migrator`, register every migration, then call
/// [`Migrator::init`] once before [`Migrator::up`], [`Migrator::down`] or
/// [`Migrator::status`]. Each `up`/`down` call runs in a single transaction:
/// either every migration of the call is applied (or reverted) and recorded,
/// or none is.
///
/// # Example
///
/// ```no_run
/// use tidemark::migration::{FnMigration, Migrator};
/// use tidemark::{connect, Dialect};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut migrator = Migrator::new();
/// migrator.register(FnMigration::new(
///     "20240101000000",
///     |m| m.create_table("users", |t| {
///         t.increments("id").primary();
///         Ok(())
///     }),
///     |m| m.drop_table("users"),
/// ))?;
///
/// let executor = connect(Dialect::Postgres, "host=localhost user=postgres dbname=app")?;
/// migrator.init(executor.as_ref(), Dialect::Postgres)?;
/// let applied = migrator.up(executor.as_ref(), 0)?;
/// println!("applied {applied} migration(s)");
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Migrator {
    registry: Registry,
    dialect: Option<Dialect>,
}

impl Migrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::DuplicateVersion` if the version is already
    /// registered and `MigrationError::RegistryFrozen` after [`Migrator::init`].
    pub fn register<M>(&mut self, migration: M) -> Result<&mut Self, MigrationError>
    where
        M: Migration + 'static,
    {
        self.register_boxed(Box::new(migration))
    }

    /// Register an already boxed migration.
    ///
    /// # Errors
    ///
    /// Same as [`Migrator::register`].
    pub fn register_boxed(
        &mut self,
        migration: Box<dyn Migration>,
    ) -> Result<&mut Self, MigrationError> {
        self.registry.register(migration)?;
        Ok(self)
    }

    /// Dialect given to [`Migrator::init`], if it has run.
    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    pub fn is_initialized(&self) -> bool {
        self.dialect.is_some()
    }

    /// Registered versions, ascending once initialized.
    pub fn versions(&self) -> Vec<&str> {
        self.registry
            .entries()
            .iter()
            .map(|e| e.migration.version())
            .collect()
    }

    /// Close registration, ensure the bookkeeping table exists and load which
    /// registered migrations are already applied.
    ///
    /// A recorded version with no registered migration is tolerated here; it
    /// only becomes an error if [`Migrator::down`] has to revert it.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Database` if the bookkeeping table cannot be
    /// created or read.
    pub fn init(&mut self, executor: &dyn Executor, dialect: Dialect) -> Result<(), MigrationError> {
        self.registry.freeze();
        state_table::initialize_state_table(executor)?;

        let applied: HashSet<String> = state_table::applied_migrations(executor)?
            .into_iter()
            .map(|record| record.version)
            .collect();

        for entry in self.registry.entries_mut() {
            entry.done = applied.contains(entry.migration.version());
        }
        for version in &applied {
            if self.registry.position(version).is_none() {
                log::warn!("applied migration {version} is not registered");
            }
        }

        log::info!(
            "migrator initialized for {dialect}: {} registered, {} applied",
            self.registry.len(),
            applied.len()
        );
        self.dialect = Some(dialect);
        Ok(())
    }

    /// Apply pending migrations in version order as one new batch.
    ///
    /// `step` limits how many pending migrations are applied; `0` applies all
    /// of them. Returns the number applied.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::NotInitialized` before [`Migrator::init`].
    /// Any migration or bookkeeping failure rolls back the whole call and is
    /// returned unchanged.
    pub fn up(&mut self, executor: &dyn Executor, step: usize) -> Result<usize, MigrationError> {
        let dialect = self.dialect.ok_or(MigrationError::NotInitialized)?;

        let limit = if step == 0 { usize::MAX } else { step };
        let pending: Vec<usize> = self
            .registry
            .entries()
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.done)
            .map(|(index, _)| index)
            .take(limit)
            .collect();

        if pending.is_empty() {
            log::info!("nothing to migrate");
            return Ok(0);
        }

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::migration_batch_span("up", dialect.as_str()).entered();

        let transaction = Transaction::begin(executor)?;
        match self.apply(executor, dialect, &pending) {
            Ok(batch) => {
                transaction.commit()?;
                for &index in &pending {
                    self.registry.entries_mut()[index].done = true;
                }
                log::info!("batch {batch}: applied {} migration(s)", pending.len());
                Ok(pending.len())
            }
            Err(e) => {
                if let Err(rollback_error) = transaction.rollback() {
                    log::error!("rollback after failed migration failed: {rollback_error}");
                }
                Err(e)
            }
        }
    }

    /// Revert the migrations recorded in the last `step` batches, newest first.
    ///
    /// `step == 0` reverts nothing. A `step` larger than the number of
    /// recorded batches reverts every batch. Returns the number reverted.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::NotInitialized` before [`Migrator::init`] and
    /// `MigrationError::Consistency` if a version to revert is not registered.
    /// Any failure rolls back the whole call.
    pub fn down(&mut self, executor: &dyn Executor, step: usize) -> Result<usize, MigrationError> {
        let dialect = self.dialect.ok_or(MigrationError::NotInitialized)?;
        if step == 0 {
            return Ok(0);
        }

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::migration_batch_span("down", dialect.as_str()).entered();

        let transaction = Transaction::begin(executor)?;
        match self.revert(executor, dialect, step) {
            Ok(reverted) => {
                transaction.commit()?;
                for &index in &reverted {
                    self.registry.entries_mut()[index].done = false;
                }
                if reverted.is_empty() {
                    log::info!("nothing to roll back");
                } else {
                    log::info!("rolled back {} migration(s)", reverted.len());
                }
                Ok(reverted.len())
            }
            Err(e) => {
                if let Err(rollback_error) = transaction.rollback() {
                    log::error!("rollback after failed revert failed: {rollback_error}");
                }
                Err(e)
            }
        }
    }

    /// Applied/pending state of every registered migration. Read-only.
    pub fn status(&self) -> MigrationStatus {
        let migrations = self
            .registry
            .entries()
            .iter()
            .map(|entry| MigrationState {
                version: entry.migration.version().to_string(),
                name: entry.migration.name().to_string(),
                applied: entry.done,
            })
            .collect();
        MigrationStatus::new(migrations)
    }

    /// Run `up` for each pending index and record it. Returns the batch number.
    fn apply(
        &self,
        executor: &dyn Executor,
        dialect: Dialect,
        pending: &[usize],
    ) -> Result<i64, MigrationError> {
        let batch = state_table::last_batch(executor)? + 1;
        let manager = SchemaManager::new(executor, dialect);

        for &index in pending {
            let migration = &self.registry.entries()[index].migration;
            let version = migration.version();

            #[cfg(feature = "tracing")]
            let _span = tracing_helpers::migration_span(version).entered();

            log::info!("Migrating {version} ({})", migration.name());
            let start = Instant::now();
            if let Err(e) = migration.up(&manager) {
                log::error!("migration {version} failed: {e}");
                return Err(e);
            }
            state_table::record_migration(
                executor,
                dialect,
                &MigrationRecord::new(version, batch),
            )?;
            log::info!("Migrated {version} in {:?}", start.elapsed());
        }
        Ok(batch)
    }

    /// Run `down` for every version above the batch floor and erase its row.
    /// Returns the registry indices reverted.
    fn revert(
        &self,
        executor: &dyn Executor,
        dialect: Dialect,
        step: usize,
    ) -> Result<Vec<usize>, MigrationError> {
        let last = state_table::last_batch(executor)?;
        let step = i64::try_from(step).unwrap_or(i64::MAX);
        let floor = last.saturating_sub(step).max(0);
        let versions = state_table::versions_above_batch(executor, dialect, floor)?;
        let manager = SchemaManager::new(executor, dialect);

        let mut reverted = Vec::with_capacity(versions.len());
        for version in versions {
            let index = self
                .registry
                .position(&version)
                .ok_or_else(|| MigrationError::Consistency {
                    version: version.clone(),
                })?;
            let migration = &self.registry.entries()[index].migration;

            #[cfg(feature = "tracing")]
            let _span = tracing_helpers::migration_span(&version).entered();

            log::info!("Rolling back {version} ({})", migration.name());
            let start = Instant::now();
            if let Err(e) = migration.down(&manager) {
                log::error!("rollback of {version} failed: {e}");
                return Err(e);
            }
            state_table::remove_migration_record(executor, dialect, &version)?;
            log::info!("Rolled back {version} in {:?}", start.elapsed());
            reverted.push(index);
        }
        Ok(reverted)
    }
}

impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("versions", &self.versions())
            .field("dialect", &self.dialect)
            .field("frozen", &self.registry.is_frozen())
            .finish()
    }
}
