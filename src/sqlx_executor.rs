//! SQLite and MySQL executors over `sqlx`
//!
//! `sqlx` is async. Each executor owns a current-thread tokio runtime and a
//! single connection, and blocks on every call. Keeping one connection means
//! `BEGIN`, the migration statements and `COMMIT` share a session.

use crate::connection::ConnectionError;
use crate::executor::{ExecError, Executor, Row, Value};
use sqlx::{ConnectOptions, Row as _, TypeInfo, ValueRef};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tokio::runtime::{Builder, Runtime};

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

#[cfg(feature = "mysql")]
use once_cell::sync::Lazy;
#[cfg(feature = "mysql")]
use regex::Regex;
#[cfg(feature = "mysql")]
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
#[cfg(feature = "sqlite")]
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};

fn runtime() -> Result<Runtime, ConnectionError> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(ConnectionError::Runtime)
}

/// Bind the engine's neutral values onto a `sqlx` query, in order.
macro_rules! bind_values {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for param in $params {
            query = match param {
                Value::Null => query.bind(None::<i64>),
                Value::Int(v) => query.bind(*v),
                Value::Text(s) => query.bind(s.as_str()),
            };
        }
        query
    }};
}

/// Executor struct plus [`Executor`] impl for one `sqlx` connection type.
///
/// Statements without parameters go through the simple query path, which
/// also accepts several `;`-separated statements.
macro_rules! sqlx_executor {
    (
        $(#[$meta:meta])*
        $name:ident, $connection:ty, $convert:path
    ) => {
        $(#[$meta])*
        pub struct $name {
            runtime: Runtime,
            connection: Mutex<$connection>,
        }

        impl $name {
            fn lock(&self) -> Result<MutexGuard<'_, $connection>, ExecError> {
                self.connection
                    .lock()
                    .map_err(|_| ExecError::Query("connection lock poisoned".to_string()))
            }
        }

        impl Executor for $name {
            fn execute(&self, query: &str, params: &[Value]) -> Result<u64, ExecError> {
                #[cfg(feature = "tracing")]
                let _span = tracing_helpers::execute_query_span(query).entered();

                let start = Instant::now();
                let mut connection = self.lock()?;
                let done = if params.is_empty() {
                    self.runtime
                        .block_on(sqlx::Executor::execute(&mut *connection, query))?
                } else {
                    let statement = bind_values!(sqlx::query(query), params);
                    self.runtime.block_on(statement.execute(&mut *connection))?
                };
                log::trace!("executed in {:?}: {}", start.elapsed(), query);
                Ok(done.rows_affected())
            }

            fn query_all(&self, query: &str, params: &[Value]) -> Result<Vec<Row>, ExecError> {
                #[cfg(feature = "tracing")]
                let _span = tracing_helpers::execute_query_span(query).entered();

                let start = Instant::now();
                let mut connection = self.lock()?;
                let rows = if params.is_empty() {
                    self.runtime
                        .block_on(sqlx::Executor::fetch_all(&mut *connection, query))?
                } else {
                    let statement = bind_values!(sqlx::query(query), params);
                    self.runtime.block_on(statement.fetch_all(&mut *connection))?
                };
                log::trace!(
                    "query returned {} rows in {:?}: {}",
                    rows.len(),
                    start.elapsed(),
                    query
                );
                rows.iter().map($convert).collect()
            }
        }
    };
}

/// Integer column types as `sqlx` names them, without `UNSIGNED`.
fn is_integer_type(name: &str) -> bool {
    matches!(
        name,
        "INTEGER" | "INT" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "BIGINT" | "INT4" | "INT8"
    )
}

fn decode_error(index: usize, type_name: &str, error: sqlx::Error) -> ExecError {
    ExecError::Decode {
        index,
        message: format!("cannot read {type_name} column: {error}"),
    }
}

#[cfg(feature = "sqlite")]
sqlx_executor! {
    /// [`Executor`] over a single `sqlx` SQLite connection
    SqliteExecutor, SqliteConnection, convert_sqlite_row
}

#[cfg(feature = "sqlite")]
impl SqliteExecutor {
    /// Open the database named by `dsn`, creating the file if it is missing.
    ///
    /// Accepts `file:<path>[?params]` as produced by
    /// [`DataSource::to_dsn`](crate::DataSource::to_dsn), a `sqlite:` URL, or a
    /// bare path. `:memory:` opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the options are invalid or the database
    /// cannot be opened.
    pub fn connect(dsn: &str) -> Result<Self, ConnectionError> {
        let options = SqliteConnectOptions::from_str(&sqlite_url(dsn))?.create_if_missing(true);
        let runtime = runtime()?;
        let start = Instant::now();
        let connection = runtime.block_on(options.connect())?;
        log::debug!("opened sqlite database in {:?}", start.elapsed());
        Ok(Self {
            runtime,
            connection: Mutex::new(connection),
        })
    }
}

/// Rewrite a `file:` DSN into the `sqlite:` URL form `sqlx` parses.
#[cfg(feature = "sqlite")]
fn sqlite_url(dsn: &str) -> String {
    if dsn.starts_with("sqlite:") {
        return dsn.to_string();
    }
    format!("sqlite:{}", dsn.strip_prefix("file:").unwrap_or(dsn))
}

#[cfg(feature = "sqlite")]
fn convert_sqlite_row(row: &SqliteRow) -> Result<Row, ExecError> {
    let mut values = Vec::with_capacity(row.len());
    for index in 0..row.len() {
        let type_name = {
            let raw = row.try_get_raw(index)?;
            if raw.is_null() {
                values.push(Value::Null);
                continue;
            }
            raw.type_info().name().to_ascii_uppercase()
        };
        let value = match type_name.as_str() {
            "BOOLEAN" => row.try_get::<bool, _>(index).map(|v| Value::Int(i64::from(v))),
            name if is_integer_type(name) => row.try_get::<i64, _>(index).map(Value::Int),
            "REAL" => row.try_get::<f64, _>(index).map(|v| Value::Text(v.to_string())),
            _ => row.try_get::<String, _>(index).map(Value::Text),
        };
        values.push(value.map_err(|e| decode_error(index, &type_name, e))?);
    }
    Ok(Row::new(values))
}

#[cfg(feature = "mysql")]
sqlx_executor! {
    /// [`Executor`] over a single `sqlx` MySQL connection
    ///
    /// MySQL commits DDL implicitly, so a failed batch keeps whatever ran
    /// before the failing statement.
    MySqlExecutor, MySqlConnection, convert_mysql_row
}

#[cfg(feature = "mysql")]
impl MySqlExecutor {
    /// Connect with a Go-style `user:pass@tcp(host:port)/db[?params]` DSN, as
    /// produced by [`DataSource::to_dsn`](crate::DataSource::to_dsn), or a
    /// `mysql://` URL.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the DSN is malformed or the server refuses
    /// the connection.
    pub fn connect(dsn: &str) -> Result<Self, ConnectionError> {
        let options = if dsn.starts_with("mysql://") {
            MySqlConnectOptions::from_str(dsn)?
        } else {
            MysqlTarget::parse(dsn)?.into_options()
        };
        let runtime = runtime()?;
        let start = Instant::now();
        let connection = runtime.block_on(options.connect())?;
        log::debug!("connected to mysql in {:?}", start.elapsed());
        Ok(Self {
            runtime,
            connection: Mutex::new(connection),
        })
    }
}

#[cfg(feature = "mysql")]
static GO_DSN: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(r"^(?:([^:@]*)(?::(.*))?@)?tcp\(([^)]*)\)/([^?]*)(?:\?(.*))?$")
});

/// The pieces of a Go-style MySQL DSN.
#[cfg(feature = "mysql")]
#[derive(Debug, Clone, PartialEq, Eq)]
struct MysqlTarget {
    username: String,
    password: Option<String>,
    host: String,
    port: Option<u16>,
    database: String,
    params: Vec<(String, String)>,
}

#[cfg(feature = "mysql")]
impl MysqlTarget {
    fn parse(dsn: &str) -> Result<Self, ConnectionError> {
        let invalid = |reason: &str| {
            ConnectionError::InvalidConnectionString(format!("{reason}: expected user:pass@tcp(host:port)/db"))
        };
        let pattern = GO_DSN
            .as_ref()
            .map_err(|e| ConnectionError::InvalidConnectionString(format!("invalid pattern: {e}")))?;
        let caps = pattern.captures(dsn).ok_or_else(|| invalid("malformed MySQL DSN"))?;
        let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string());

        let address = group(3).unwrap_or_default();
        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.parse().map_err(|_| invalid("invalid port"))?;
                (host.to_string(), Some(port))
            }
            None => (address, None),
        };
        if host.is_empty() {
            return Err(invalid("missing host"));
        }

        let params = group(5)
            .map(|query| {
                query
                    .split('&')
                    .filter(|pair| !pair.is_empty())
                    .map(|pair| match pair.split_once('=') {
                        Some((k, v)) => (k.to_string(), v.to_string()),
                        None => (pair.to_string(), String::new()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            username: group(1).unwrap_or_default(),
            password: group(2),
            host,
            port,
            database: group(4).unwrap_or_default(),
            params,
        })
    }

    fn into_options(self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new().host(&self.host);
        if let Some(port) = self.port {
            options = options.port(port);
        }
        if !self.username.is_empty() {
            options = options.username(&self.username);
        }
        if let Some(password) = &self.password {
            options = options.password(password);
        }
        if !self.database.is_empty() {
            options = options.database(&self.database);
        }
        for (key, value) in &self.params {
            match key.as_str() {
                "charset" => options = options.charset(value),
                "collation" => options = options.collation(value),
                _ => log::debug!("mysql: ignoring DSN parameter '{key}'"),
            }
        }
        options
    }
}

#[cfg(feature = "mysql")]
fn convert_mysql_row(row: &MySqlRow) -> Result<Row, ExecError> {
    let mut values = Vec::with_capacity(row.len());
    for index in 0..row.len() {
        let type_name = {
            let raw = row.try_get_raw(index)?;
            if raw.is_null() {
                values.push(Value::Null);
                continue;
            }
            raw.type_info().name().to_ascii_uppercase()
        };
        let value = match type_name.as_str() {
            "BOOLEAN" => row.try_get::<bool, _>(index).map(|v| Value::Int(i64::from(v))),
            name if name.ends_with(" UNSIGNED") => {
                let v = row
                    .try_get::<u64, _>(index)
                    .map_err(|e| decode_error(index, &type_name, e))?;
                let v = i64::try_from(v).map_err(|e| ExecError::Decode {
                    index,
                    message: e.to_string(),
                })?;
                Ok(Value::Int(v))
            }
            name if is_integer_type(name) => row.try_get::<i64, _>(index).map(Value::Int),
            "DOUBLE" => row.try_get::<f64, _>(index).map(|v| Value::Text(v.to_string())),
            _ => row.try_get::<String, _>(index).map(Value::Text),
        };
        values.push(value.map_err(|e| decode_error(index, &type_name, e))?);
    }
    Ok(Row::new(values))
}
