//! DSN builder
//!
//! Turns discrete connection settings into the connection string each driver
//! expects:
//!
//! | Dialect    | Format                                                   |
//! |------------|----------------------------------------------------------|
//! | SQLite     | `file:<name>[?params]`                                   |
//! | MySQL      | `user:pass@tcp(host:port)/name[?params]`                 |
//! | PostgreSQL | `host=h port=p user=u[ password=pw] dbname=n[ k=v ...]`  |

use crate::dialect::{Dialect, DialectError};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static PARAMS: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(r"^(?:[a-zA-Z0-9]+=[a-zA-Z0-9]+)(?:&[a-zA-Z0-9]+=[a-zA-Z0-9]+)*$")
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DsnError {
    #[error(transparent)]
    Dialect(#[from] DialectError),
    #[error("DB {0} is required")]
    MissingField(&'static str),
    #[error("Invalid params '{0}': expected key=value pairs joined by '&'")]
    InvalidParams(String),
}

/// Connection settings for one database.
///
/// `dialect` is kept as text so values read from configuration can be
/// validated here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSource {
    pub dialect: String,
    pub host: String,
    pub port: Option<u16>,
    pub username: String,
    pub password: String,
    pub name: String,
    /// `key=value&key=value`, or empty.
    pub params: String,
}

impl DataSource {
    pub fn new(dialect: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn params(mut self, params: impl Into<String>) -> Self {
        self.params = params.into();
        self
    }

    /// Parsed dialect.
    ///
    /// # Errors
    ///
    /// `DsnError::Dialect` when the dialect is empty or unsupported.
    pub fn parsed_dialect(&self) -> Result<Dialect, DsnError> {
        Ok(self.dialect.parse::<Dialect>()?)
    }

    /// Render the driver-specific connection string.
    ///
    /// # Errors
    ///
    /// Returns `DsnError` when the dialect is unusable, a required field is
    /// empty, or `params` is malformed.
    pub fn to_dsn(&self) -> Result<String, DsnError> {
        let dialect = self.parsed_dialect()?;

        if dialect != Dialect::Sqlite {
            if self.host.is_empty() {
                return Err(DsnError::MissingField("Host"));
            }
            if self.username.is_empty() {
                return Err(DsnError::MissingField("Username"));
            }
        }
        if self.name.is_empty() {
            return Err(DsnError::MissingField("Name"));
        }
        validate_params(&self.params)?;

        let dsn = match dialect {
            Dialect::Sqlite => {
                if self.params.is_empty() {
                    format!("file:{}", self.name)
                } else {
                    format!("file:{}?{}", self.name, self.params)
                }
            }
            Dialect::Mysql => {
                let port = self.port.unwrap_or(3306);
                let mut dsn = format!(
                    "{}:{}@tcp({}:{})/{}",
                    self.username, self.password, self.host, port, self.name
                );
                if !self.params.is_empty() {
                    dsn.push('?');
                    dsn.push_str(&self.params);
                }
                dsn
            }
            Dialect::Postgres => {
                let port = self.port.unwrap_or(5432);
                let mut dsn = format!("host={} port={} user={}", self.host, port, self.username);
                if !self.password.is_empty() {
                    dsn.push_str(" password=");
                    dsn.push_str(&self.password);
                }
                dsn.push_str(" dbname=");
                dsn.push_str(&self.name);
                for pair in self.params.split('&').filter(|p| !p.is_empty()) {
                    dsn.push(' ');
                    dsn.push_str(pair);
                }
                dsn
            }
        };
        log::trace!("built {dialect} DSN for database {}", self.name);
        Ok(dsn)
    }
}

/// Accept an empty string or `key=value(&key=value)*` with alphanumeric parts.
///
/// # Errors
///
/// `DsnError::InvalidParams` for anything else.
pub fn validate_params(params: &str) -> Result<(), DsnError> {
    if params.is_empty() {
        return Ok(());
    }
    let re = PARAMS
        .as_ref()
        .map_err(|e| DsnError::InvalidParams(format!("{params} ({e})")))?;
    if re.is_match(params) {
        Ok(())
    } else {
        Err(DsnError::InvalidParams(params.to_string()))
    }
}
