//! SQL dialects understood by the compiler and the migration engine.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Raised when a driver name does not map to a supported dialect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialectError {
    #[error("dialect is not set")]
    Unset,
    #[error("unsupported dialect '{0}' (expected sqlite, mysql or postgres)")]
    Unsupported(String),
}

/// One of the three supported SQL variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Sqlite,
    Mysql,
    Postgres,
}

impl Dialect {
    /// All supported dialects, in a stable order.
    pub const ALL: [Dialect; 3] = [Dialect::Sqlite, Dialect::Mysql, Dialect::Postgres];

    /// Canonical lowercase name, as accepted by [`Dialect::from_str`].
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Mysql => "mysql",
            Dialect::Postgres => "postgres",
        }
    }

    /// Bind placeholder for the `n`-th (1-based) parameter of a statement.
    ///
    /// ```
    /// use tidemark::Dialect;
    ///
    /// assert_eq!(Dialect::Mysql.placeholder(2), "?");
    /// assert_eq!(Dialect::Postgres.placeholder(2), "$2");
    /// ```
    pub fn placeholder(self, n: usize) -> String {
        match self {
            Dialect::Sqlite | Dialect::Mysql => "?".to_string(),
            Dialect::Postgres => format!("${n}"),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let driver = s.trim();
        if driver.is_empty() {
            return Err(DialectError::Unset);
        }
        match driver.to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "mysql" => Ok(Dialect::Mysql),
            "postgres" | "postgresql" | "pgsql" => Ok(Dialect::Postgres),
            _ => Err(DialectError::Unsupported(driver.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_driver_aliases() {
        assert_eq!("sqlite3".parse::<Dialect>(), Ok(Dialect::Sqlite));
        assert_eq!("MySQL".parse::<Dialect>(), Ok(Dialect::Mysql));
        assert_eq!("postgresql".parse::<Dialect>(), Ok(Dialect::Postgres));
        assert_eq!(" pgsql ".parse::<Dialect>(), Ok(Dialect::Postgres));
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        assert_eq!("".parse::<Dialect>(), Err(DialectError::Unset));
        assert_eq!(
            "oracle".parse::<Dialect>(),
            Err(DialectError::Unsupported("oracle".to_string()))
        );
    }

    #[test]
    fn test_display_round_trips() {
        for dialect in Dialect::ALL {
            assert_eq!(dialect.to_string().parse::<Dialect>(), Ok(dialect));
        }
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::Sqlite.placeholder(1), "?");
        assert_eq!(Dialect::Postgres.placeholder(1), "$1");
    }
}
