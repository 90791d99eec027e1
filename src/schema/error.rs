//! Author-time validation errors raised while describing or compiling a table.

use thiserror::Error;

/// Errors produced by the schema builder and the DDL compiler.
///
/// Every variant points at a defect in the migration being written rather than
/// at the database, so none of them is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("dialect is not set on data type '{type_name}'")]
    DialectNotSet { type_name: String },
    #[error("column name is not set on data type '{type_name}'")]
    ColumnNameNotSet { type_name: String },
    #[error("unknown column type '{0}'")]
    UnknownType(String),
    #[error("cannot add primary key to '{table}' while a primary key drop is pending")]
    PrimaryKeyDropPending { table: String },
    #[error("cannot drop primary key of '{table}' while a primary key add is pending")]
    PrimaryKeyAddPending { table: String },
    #[error("table '{table}' already has a primary key constraint")]
    DuplicatePrimaryKey { table: String },
    #[error("constraint on '{table}' needs at least one column")]
    EmptyColumnList { table: String },
    #[error("foreign key '{name}' has no referenced table or column")]
    IncompleteForeignKey { name: String },
    #[error("column '{column}' needs a data type for this operation")]
    MissingDataType { column: String },
}
