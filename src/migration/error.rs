//! Migration-specific error types

use crate::connection::ConnectionError;
use crate::dialect::DialectError;
use crate::dsn::DsnError;
use crate::executor::ExecError;
use crate::schema::SchemaError;
use thiserror::Error;

/// Broad classification of a [`MigrationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unsupported or unset dialect/driver.
    Configuration,
    /// A defect in the migration being authored or in its registration.
    Validation,
    /// A statement failed; the enclosing transaction was rolled back.
    Execution,
    /// The bookkeeping table references code that no longer exists.
    Consistency,
}

/// Migration-specific errors
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Dialect(#[from] DialectError),
    #[error(transparent)]
    Dsn(#[from] DsnError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("Database error: {0}")]
    Database(#[from] ExecError),
    #[error("Migration version '{0}' is already registered")]
    DuplicateVersion(String),
    #[error("Invalid migration version '{0}'")]
    InvalidVersion(String),
    #[error("Cannot register migration '{0}': the migrator has already been initialized")]
    RegistryFrozen(String),
    #[error("Migrator is not initialized; call init() first")]
    NotInitialized,
    #[error(
        "Applied migration '{version}' has no registered migration.\n\
         The bookkeeping table and the registered migrations have drifted apart."
    )]
    Consistency { version: String },
    #[error("Invalid migration name '{0}': use lowercase letters, digits and underscores")]
    InvalidName(String),
    #[error("Migration file error: {0}")]
    Io(#[from] std::io::Error),
}

impl MigrationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrationError::Dialect(_)
            | MigrationError::Dsn(DsnError::Dialect(_))
            | MigrationError::Connection(ConnectionError::NoDriver(_))
            | MigrationError::NotInitialized => ErrorKind::Configuration,
            MigrationError::Dsn(_) => ErrorKind::Validation,
            MigrationError::Schema(_)
            | MigrationError::DuplicateVersion(_)
            | MigrationError::InvalidVersion(_)
            | MigrationError::RegistryFrozen(_)
            | MigrationError::InvalidName(_) => ErrorKind::Validation,
            MigrationError::Database(_) | MigrationError::Connection(_) | MigrationError::Io(_) => {
                ErrorKind::Execution
            }
            MigrationError::Consistency { .. } => ErrorKind::Consistency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            MigrationError::from(DialectError::Unset).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            MigrationError::from(SchemaError::UnknownType("x".into())).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            MigrationError::from(DsnError::MissingField("Host")).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            MigrationError::from(DsnError::Dialect(DialectError::Unset)).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            MigrationError::from(ExecError::NoRows).kind(),
            ErrorKind::Execution
        );
        assert_eq!(
            MigrationError::Consistency {
                version: "1".into()
            }
            .kind(),
            ErrorKind::Consistency
        );
    }

    #[test]
    fn test_consistency_message_names_version() {
        let err = MigrationError::Consistency {
            version: "20240101000000".into(),
        };
        assert!(err.to_string().contains("20240101000000"));
    }
}
