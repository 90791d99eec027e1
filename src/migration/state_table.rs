//! The `schema_migrations` bookkeeping table.
//!
//! One row per applied migration: its version and the batch it was applied
//! in. The layout is the same on every dialect; only bind placeholders differ.

use super::record::MigrationRecord;
use crate::dialect::Dialect;
use crate::executor::{ExecError, Executor, Value};

pub const STATE_TABLE: &str = "schema_migrations";

/// Create the bookkeeping table if it does not exist yet.
///
/// # Errors
///
/// Returns `ExecError` if the statement fails.
pub fn initialize_state_table(executor: &dyn Executor) -> Result<(), ExecError> {
    let sql = format!(
        "CREATE TABLE IF NOT EXISTS {STATE_TABLE} (version VARCHAR(255) NOT NULL PRIMARY KEY, batch INT NOT NULL)"
    );
    executor.execute(&sql, &[])?;
    Ok(())
}

/// All recorded migrations, ordered by version.
pub fn applied_migrations(executor: &dyn Executor) -> Result<Vec<MigrationRecord>, ExecError> {
    let sql = format!("SELECT version, batch FROM {STATE_TABLE} ORDER BY version");
    executor
        .query_all(&sql, &[])?
        .iter()
        .map(MigrationRecord::from_row)
        .collect()
}

/// Highest recorded batch, or 0 when nothing is applied.
pub fn last_batch(executor: &dyn Executor) -> Result<i64, ExecError> {
    let sql = format!("SELECT COALESCE(MAX(batch), 0) FROM {STATE_TABLE}");
    executor.query_one(&sql, &[])?.get_i64(0)
}

/// Versions recorded in a batch above `floor`, newest batch first and, within
/// a batch, highest version first.
pub fn versions_above_batch(
    executor: &dyn Executor,
    dialect: Dialect,
    floor: i64,
) -> Result<Vec<String>, ExecError> {
    let sql = format!(
        "SELECT version FROM {STATE_TABLE} WHERE batch > {} ORDER BY batch DESC, version DESC",
        dialect.placeholder(1)
    );
    executor
        .query_all(&sql, &[Value::Int(floor)])?
        .iter()
        .map(|row| row.get_string(0))
        .collect()
}

pub fn record_migration(
    executor: &dyn Executor,
    dialect: Dialect,
    record: &MigrationRecord,
) -> Result<(), ExecError> {
    let sql = format!(
        "INSERT INTO {STATE_TABLE} (version, batch) VALUES ({}, {})",
        dialect.placeholder(1),
        dialect.placeholder(2)
    );
    executor.execute(
        &sql,
        &[Value::from(record.version.as_str()), Value::Int(record.batch)],
    )?;
    Ok(())
}

pub fn remove_migration_record(
    executor: &dyn Executor,
    dialect: Dialect,
    version: &str,
) -> Result<(), ExecError> {
    let sql = format!(
        "DELETE FROM {STATE_TABLE} WHERE version = {}",
        dialect.placeholder(1)
    );
    executor.execute(&sql, &[Value::from(version)])?;
    Ok(())
}
