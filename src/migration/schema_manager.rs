//! SchemaManager - the handle migrations use to change the schema

use super::error::MigrationError;
use crate::dialect::Dialect;
use crate::executor::{Executor, Value};
use crate::schema::{Schema, SchemaError, Table};

/// Compiles schema changes for the migrator's dialect and runs them on the
/// migrator's executor, inside the batch transaction.
pub struct SchemaManager<'a> {
    executor: &'a dyn Executor,
    dialect: Dialect,
}

impl<'a> SchemaManager<'a> {
    pub fn new(executor: &'a dyn Executor, dialect: Dialect) -> Self {
        Self { executor, dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The executor statements run on, for queries the builder cannot express.
    pub fn executor(&self) -> &'a dyn Executor {
        self.executor
    }

    /// Create a table
    ///
    /// # Example
    /// ```rust,no_run
    /// # use tidemark::migration::{MigrationError, SchemaManager};
    /// # fn up(manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
    /// manager.create_table("users", |t| {
    ///     t.increments("id").primary();
    ///     t.string("email", 255).unique();
    ///     t.timestamps();
    ///     Ok(())
    /// })?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn create_table<F>(&self, table: &str, define: F) -> Result<(), MigrationError>
    where
        F: FnOnce(&mut Table) -> Result<(), SchemaError>,
    {
        let schema = Schema::create(self.dialect, table, define)?;
        self.run(&schema)
    }

    /// Alter a table
    ///
    /// # Example
    /// ```rust,no_run
    /// # use tidemark::migration::{MigrationError, SchemaManager};
    /// # fn up(manager: &SchemaManager<'_>) -> Result<(), MigrationError> {
    /// manager.alter_table("users", |t| {
    ///     t.string("avatar_url", 255).nullable();
    ///     t.rename_column("username", "name");
    ///     Ok(())
    /// })?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn alter_table<F>(&self, table: &str, define: F) -> Result<(), MigrationError>
    where
        F: FnOnce(&mut Table) -> Result<(), SchemaError>,
    {
        let schema = Schema::alter(self.dialect, table, define)?;
        self.run(&schema)
    }

    /// Drop a table
    pub fn drop_table(&self, table: &str) -> Result<(), MigrationError> {
        self.run(&Schema::drop(self.dialect, table))
    }

    /// Compile `schema` and execute its statements in order.
    ///
    /// # Errors
    ///
    /// Returns the first compile or execution error; later statements are skipped.
    pub fn run(&self, schema: &Schema) -> Result<(), MigrationError> {
        for statement in schema.statements()? {
            log::debug!("{statement}");
            self.executor.execute(&statement, &[])?;
        }
        Ok(())
    }

    /// Execute raw SQL
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Database` if the statement fails.
    pub fn execute(&self, sql: &str) -> Result<u64, MigrationError> {
        log::debug!("{sql}");
        Ok(self.executor.execute(sql, &[])?)
    }

    /// Execute raw SQL with bind parameters in the dialect's placeholder style.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Database` if the statement fails.
    pub fn execute_with(&self, sql: &str, params: &[Value]) -> Result<u64, MigrationError> {
        log::debug!("{sql}");
        Ok(self.executor.execute(sql, params)?)
    }
}
