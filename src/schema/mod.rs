//! Schema Compiler
//!
//! Describe a table change once and compile it to SQLite, MySQL or PostgreSQL
//! DDL. A [`Schema`] is bound to one [`Table`] and one operation (create, alter
//! or drop); [`Schema::build`] renders the statements without touching any
//! database.
//!
//! # Example
//!
//! ```
//! use tidemark::schema::Schema;
//! use tidemark::Dialect;
//!
//! let schema = Schema::create(Dialect::Mysql, "users", |t| {
//!     t.increments("id").primary();
//!     t.string("email", 100).unique();
//!     t.integer("role_id");
//!     t.foreign_key(["role_id"])
//!         .references("id")
//!         .on("roles")
//!         .on_delete("CASCADE");
//!     Ok(())
//! })?;
//!
//! assert_eq!(
//!     schema.build()?,
//!     "CREATE TABLE users (id INT UNSIGNED NOT NULL PRIMARY KEY AUTO_INCREMENT, \
//!      email VARCHAR(100) NOT NULL UNIQUE, role_id INT NOT NULL, \
//!      FOREIGN KEY (role_id) REFERENCES roles(id) ON DELETE CASCADE);"
//! );
//! # Ok::<(), tidemark::schema::SchemaError>(())
//! ```

mod column;
mod compiler;
mod constraint;
mod data_type;
mod error;
mod table;

pub use column::{Column, ColumnOperation, DefaultValue};
pub use constraint::{Constraint, ConstraintKind, ConstraintOperation, ForeignKeyTarget};
pub use data_type::{ColumnType, DataType, RenderedType};
pub use error::SchemaError;
pub use table::{Table, TableOperation};

use crate::dialect::Dialect;

/// Top-level compiler handle: one table, one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    table: Table,
}

impl Schema {
    /// Start an empty schema; populate it through [`Schema::table_mut`].
    pub fn new(dialect: Dialect, table: &str, operation: TableOperation) -> Self {
        Self {
            table: Table::new(table, dialect, operation),
        }
    }

    /// `CREATE TABLE`, with columns and constraints added by `define`.
    ///
    /// # Errors
    ///
    /// Propagates any validation error returned from `define`.
    pub fn create<F>(dialect: Dialect, table: &str, define: F) -> Result<Self, SchemaError>
    where
        F: FnOnce(&mut Table) -> Result<(), SchemaError>,
    {
        let mut schema = Self::new(dialect, table, TableOperation::Create);
        define(&mut schema.table)?;
        Ok(schema)
    }

    /// `ALTER TABLE`, with the column and constraint deltas added by `define`.
    ///
    /// # Errors
    ///
    /// Propagates any validation error returned from `define`.
    pub fn alter<F>(dialect: Dialect, table: &str, define: F) -> Result<Self, SchemaError>
    where
        F: FnOnce(&mut Table) -> Result<(), SchemaError>,
    {
        let mut schema = Self::new(dialect, table, TableOperation::Alter);
        define(&mut schema.table)?;
        Ok(schema)
    }

    /// `DROP TABLE`.
    pub fn drop(dialect: Dialect, table: &str) -> Self {
        Self::new(dialect, table, TableOperation::Drop)
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }

    pub fn table_name(&self) -> &str {
        self.table.name()
    }

    pub fn operation(&self) -> TableOperation {
        self.table.operation()
    }

    pub fn dialect(&self) -> Dialect {
        self.table.dialect()
    }

    /// Compile to individual statements, in execution order.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] when a column type cannot be rendered or a
    /// foreign key is missing its target.
    pub fn statements(&self) -> Result<Vec<String>, SchemaError> {
        compiler::compile(&self.table)
    }

    /// Compile to a single string, statements separated by newlines.
    ///
    /// # Errors
    ///
    /// Same as [`Schema::statements`].
    pub fn build(&self) -> Result<String, SchemaError> {
        Ok(self.statements()?.join("\n"))
    }
}
