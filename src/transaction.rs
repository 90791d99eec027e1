//! Transaction guard used by the migration engine.
//!
//! A [`Transaction`] issues `BEGIN` through an [`Executor`] and guarantees the
//! matching `COMMIT` or `ROLLBACK`. Dropping an open guard rolls back.

use crate::executor::{ExecError, Executor};

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// An open transaction on an executor's connection.
///
/// Statements run through the same executor while the guard is alive belong
/// to the transaction.
///
/// # Examples
///
/// ```no_run
/// use tidemark::{connect, Dialect, Executor, Transaction};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = connect(Dialect::Postgres, "host=localhost user=postgres dbname=app")?;
///
/// let transaction = Transaction::begin(executor.as_ref())?;
/// executor.execute("INSERT INTO users (name) VALUES ($1)", &["Alice".into()])?;
/// transaction.commit()?;
/// # Ok(())
/// # }
/// ```
pub struct Transaction<'a> {
    executor: &'a dyn Executor,
    closed: bool,
}

impl<'a> Transaction<'a> {
    /// Start a transaction.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if `BEGIN` fails.
    pub fn begin(executor: &'a dyn Executor) -> Result<Self, ExecError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::begin_transaction_span().entered();

        executor.begin()?;
        log::debug!("transaction started");
        Ok(Self {
            executor,
            closed: false,
        })
    }

    /// Commit the transaction.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if `COMMIT` fails; the guard is closed either way.
    pub fn commit(mut self) -> Result<(), ExecError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::commit_transaction_span().entered();

        self.closed = true;
        self.executor.commit()?;
        log::debug!("transaction committed");
        Ok(())
    }

    /// Roll back the transaction.
    ///
    /// # Errors
    ///
    /// Returns `ExecError` if `ROLLBACK` fails; the guard is closed either way.
    pub fn rollback(mut self) -> Result<(), ExecError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::rollback_transaction_span().entered();

        self.closed = true;
        self.executor.rollback()?;
        log::debug!("transaction rolled back");
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.executor.rollback() {
            log::error!("rollback of abandoned transaction failed: {e}");
        }
    }
}
