//! Execution handle
//!
//! The migration engine talks to a database only through the [`Executor`]
//! trait: parameterized statements, row queries and transaction control.
//! [`MayPostgresExecutor`] implements it over `may_postgres`; the `sqlite` and
//! `mysql` features add `sqlx`-backed executors, and callers may plug in their
//! own implementation.

use bytes::BytesMut;
use may_postgres::types::{FromSql, IsNull, ToSql, Type};
use may_postgres::{Client, Error as PostgresError, Row as PgRow};
use std::error::Error as StdError;
use std::time::Instant;
use thiserror::Error;

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Execution error type
#[derive(Debug, Error)]
pub enum ExecError {
    /// `PostgreSQL` error from `may_postgres`
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] PostgresError),
    /// SQLite or MySQL error from `sqlx`
    #[cfg(any(feature = "sqlite", feature = "mysql"))]
    #[error("SQL error: {0}")]
    Sqlx(#[from] sqlx::Error),
    /// Statement rejected by a non-PostgreSQL driver
    #[error("Query error: {0}")]
    Query(String),
    #[error("Query returned no rows")]
    NoRows,
    #[error("Query returned {0} rows where one was expected")]
    TooManyRows(usize),
    /// A column could not be read as the requested type
    #[error("Decode error in column {index}: {message}")]
    Decode { index: usize, message: String },
}

/// A bind parameter or a column value, independent of the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// One result row, values in select-list order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Read column `index` as an integer. Numeric text is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Decode`] for a missing column, `NULL`, or text
    /// that is not an integer.
    pub fn get_i64(&self, index: usize) -> Result<i64, ExecError> {
        match self.values.get(index) {
            Some(Value::Int(v)) => Ok(*v),
            Some(Value::Text(s)) => s.trim().parse().map_err(|_| ExecError::Decode {
                index,
                message: format!("'{s}' is not an integer"),
            }),
            Some(Value::Null) => Err(ExecError::Decode {
                index,
                message: "unexpected NULL".to_string(),
            }),
            None => Err(ExecError::Decode {
                index,
                message: format!("row has {} columns", self.values.len()),
            }),
        }
    }

    /// Read column `index` as text. Integers are formatted.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Decode`] for a missing column or `NULL`.
    pub fn get_string(&self, index: usize) -> Result<String, ExecError> {
        match self.values.get(index) {
            Some(Value::Text(s)) => Ok(s.clone()),
            Some(Value::Int(v)) => Ok(v.to_string()),
            Some(Value::Null) => Err(ExecError::Decode {
                index,
                message: "unexpected NULL".to_string(),
            }),
            None => Err(ExecError::Decode {
                index,
                message: format!("row has {} columns", self.values.len()),
            }),
        }
    }
}

/// Trait for executing database operations
///
/// Implementations decide how statements reach the database; the engine only
/// relies on these methods. Placeholders in `query` follow the dialect of the
/// underlying connection (`?` or `$n`).
///
/// # Examples
///
/// ```no_run
/// use tidemark::{connect, Dialect, Executor, ExecError};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = connect(Dialect::Postgres, "host=localhost user=postgres dbname=app")?;
///
/// executor.execute("DELETE FROM users WHERE id = $1", &[42i64.into()])?;
/// let row = executor.query_one("SELECT COUNT(*) FROM users", &[])?;
/// let count = row.get_i64(0)?;
/// # Ok(())
/// # }
/// ```
pub trait Executor {
    /// Execute a statement and return the number of rows affected.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if the statement fails.
    fn execute(&self, query: &str, params: &[Value]) -> Result<u64, ExecError>;

    /// Execute a query and return all rows.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if the query fails.
    fn query_all(&self, query: &str, params: &[Value]) -> Result<Vec<Row>, ExecError>;

    /// Execute a query that must return exactly one row.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if the query fails or does not return exactly one row.
    fn query_one(&self, query: &str, params: &[Value]) -> Result<Row, ExecError> {
        let mut rows = self.query_all(query, params)?;
        match rows.len() {
            0 => Err(ExecError::NoRows),
            1 => Ok(rows.remove(0)),
            n => Err(ExecError::TooManyRows(n)),
        }
    }

    /// Open a transaction on the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if the connection refuses the transaction.
    fn begin(&self) -> Result<(), ExecError> {
        self.execute("BEGIN", &[]).map(|_| ())
    }

    /// # Errors
    ///
    /// Returns `ExecError` if the commit fails.
    fn commit(&self) -> Result<(), ExecError> {
        self.execute("COMMIT", &[]).map(|_| ())
    }

    /// # Errors
    ///
    /// Returns `ExecError` if the rollback fails.
    fn rollback(&self) -> Result<(), ExecError> {
        self.execute("ROLLBACK", &[]).map(|_| ())
    }
}

impl<E: Executor + ?Sized> Executor for &E {
    fn execute(&self, query: &str, params: &[Value]) -> Result<u64, ExecError> {
        (**self).execute(query, params)
    }

    fn query_all(&self, query: &str, params: &[Value]) -> Result<Vec<Row>, ExecError> {
        (**self).query_all(query, params)
    }

    fn query_one(&self, query: &str, params: &[Value]) -> Result<Row, ExecError> {
        (**self).query_one(query, params)
    }

    fn begin(&self) -> Result<(), ExecError> {
        (**self).begin()
    }

    fn commit(&self) -> Result<(), ExecError> {
        (**self).commit()
    }

    fn rollback(&self) -> Result<(), ExecError> {
        (**self).rollback()
    }
}

impl<E: Executor + ?Sized> Executor for Box<E> {
    fn execute(&self, query: &str, params: &[Value]) -> Result<u64, ExecError> {
        (**self).execute(query, params)
    }

    fn query_all(&self, query: &str, params: &[Value]) -> Result<Vec<Row>, ExecError> {
        (**self).query_all(query, params)
    }

    fn query_one(&self, query: &str, params: &[Value]) -> Result<Row, ExecError> {
        (**self).query_one(query, params)
    }

    fn begin(&self) -> Result<(), ExecError> {
        (**self).begin()
    }

    fn commit(&self) -> Result<(), ExecError> {
        (**self).commit()
    }

    fn rollback(&self) -> Result<(), ExecError> {
        (**self).rollback()
    }
}

/// Implementation of [`Executor`] for `may_postgres::Client`
pub struct MayPostgresExecutor {
    client: Client,
}

impl MayPostgresExecutor {
    /// Create a new executor from a `may_postgres::Client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Consume the executor and return the underlying client
    pub fn into_client(self) -> Client {
        self.client
    }
}

impl Executor for MayPostgresExecutor {
    fn execute(&self, query: &str, params: &[Value]) -> Result<u64, ExecError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(query).entered();

        let start = Instant::now();
        let binds = bind_params(params);
        let affected = self.client.execute(query, &binds)?;
        log::trace!("executed in {:?}: {}", start.elapsed(), query);
        Ok(affected)
    }

    fn query_all(&self, query: &str, params: &[Value]) -> Result<Vec<Row>, ExecError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(query).entered();

        let start = Instant::now();
        let binds = bind_params(params);
        let rows = self.client.query(query, &binds)?;
        log::trace!(
            "query returned {} rows in {:?}: {}",
            rows.len(),
            start.elapsed(),
            query
        );
        rows.iter().map(convert_row).collect()
    }
}

fn bind_params(params: &[Value]) -> Vec<&dyn ToSql> {
    params.iter().map(|p| p as &dyn ToSql).collect()
}

fn convert_row(row: &PgRow) -> Result<Row, ExecError> {
    let mut values = Vec::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        let ty = column.type_();
        let value = if *ty == Type::INT2 {
            row.try_get::<_, Option<i16>>(index)?.map(|v| Value::Int(i64::from(v)))
        } else if *ty == Type::INT4 {
            row.try_get::<_, Option<i32>>(index)?.map(|v| Value::Int(i64::from(v)))
        } else if *ty == Type::INT8 {
            row.try_get::<_, Option<i64>>(index)?.map(Value::Int)
        } else if *ty == Type::BOOL {
            row.try_get::<_, Option<bool>>(index)?.map(|v| Value::Int(i64::from(v)))
        } else if <String as FromSql<'_>>::accepts(ty) {
            row.try_get::<_, Option<String>>(index)?.map(Value::Text)
        } else {
            return Err(ExecError::Decode {
                index,
                message: format!("unsupported column type {ty}"),
            });
        };
        values.push(value.unwrap_or(Value::Null));
    }
    Ok(Row::new(values))
}

type BoxError = Box<dyn StdError + Sync + Send>;

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            // Narrow to the declared width; `batch` is a 4-byte INT.
            Value::Int(v) if *ty == Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
            Value::Int(v) if *ty == Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
            Value::Int(v) => v.to_sql(ty, out),
            Value::Text(s) => s.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        <i64 as ToSql>::accepts(ty)
            || <i32 as ToSql>::accepts(ty)
            || <i16 as ToSql>::accepts(ty)
            || <String as ToSql>::accepts(ty)
    }

    fn to_sql_checked(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        let accepted = match self {
            Value::Null => true,
            Value::Int(_) => {
                <i64 as ToSql>::accepts(ty)
                    || <i32 as ToSql>::accepts(ty)
                    || <i16 as ToSql>::accepts(ty)
            }
            Value::Text(_) => <String as ToSql>::accepts(ty),
        };
        if !accepted {
            return Err(format!("cannot bind {self:?} to a {ty} parameter").into());
        }
        self.to_sql(ty, out)
    }
}
