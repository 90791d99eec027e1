//! Bookkeeping row for an applied migration

use crate::executor::{ExecError, Row};

/// One row of `schema_migrations`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRecord {
    pub version: String,
    /// Batch the migration was applied in, starting at 1.
    pub batch: i64,
}

impl MigrationRecord {
    pub fn new(version: impl Into<String>, batch: i64) -> Self {
        Self {
            version: version.into(),
            batch,
        }
    }

    /// Read a `(version, batch)` row.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::Decode` if either column is missing or mistyped.
    pub fn from_row(row: &Row) -> Result<Self, ExecError> {
        Ok(Self {
            version: row.get_string(0)?,
            batch: row.get_i64(1)?,
        })
    }
}
