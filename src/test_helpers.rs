//! Test helpers
//!
//! [`MockExecutor`] is an in-memory [`Executor`] that understands the
//! bookkeeping statements issued by the migration engine, honours
//! `BEGIN`/`COMMIT`/`ROLLBACK`, records every statement, and can be told to
//! fail on demand. Enable the `test-helpers` feature to use it from other crates.

use crate::executor::{ExecError, Executor, Row, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default, Clone)]
struct Bookkeeping {
    table_exists: bool,
    rows: BTreeMap<String, i64>,
}

#[derive(Debug, Default)]
struct MockState {
    committed: Bookkeeping,
    snapshot: Option<Bookkeeping>,
    statements: Vec<String>,
    fail_on: Vec<String>,
}

/// In-memory executor for engine and schema tests.
///
/// Clones share state, so a test can hand one clone to the code under test
/// and inspect another.
///
/// ```
/// use tidemark::test_helpers::MockExecutor;
/// use tidemark::Executor;
///
/// let executor = MockExecutor::new();
/// executor.fail_on("DROP TABLE");
/// assert!(executor.execute("DROP TABLE users;", &[]).is_err());
/// assert_eq!(executor.statements(), ["DROP TABLE users;"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockExecutor {
    state: Arc<Mutex<MockState>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Fail any later statement containing `fragment`.
    pub fn fail_on(&self, fragment: impl Into<String>) {
        self.lock().fail_on.push(fragment.into());
    }

    pub fn clear_failures(&self) {
        self.lock().fail_on.clear();
    }

    /// Every statement received so far, including failed ones.
    pub fn statements(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    pub fn clear_statements(&self) {
        self.lock().statements.clear();
    }

    /// Count of received statements containing `fragment`.
    pub fn count_matching(&self, fragment: &str) -> usize {
        self.lock()
            .statements
            .iter()
            .filter(|s| s.contains(fragment))
            .count()
    }

    /// Committed bookkeeping rows as `(version, batch)`, ordered by version.
    pub fn applied(&self) -> Vec<(String, i64)> {
        self.lock()
            .committed
            .rows
            .iter()
            .map(|(version, batch)| (version.clone(), *batch))
            .collect()
    }

    /// Insert a committed bookkeeping row, creating the table if needed.
    pub fn seed_applied(&self, version: &str, batch: i64) {
        let mut state = self.lock();
        state.committed.table_exists = true;
        state.committed.rows.insert(version.to_string(), batch);
    }

    /// Whether a transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.lock().snapshot.is_some()
    }

    fn run(&self, query: &str, params: &[Value]) -> Result<Vec<Row>, ExecError> {
        let mut state = self.lock();
        state.statements.push(query.to_string());

        if let Some(fragment) = state.fail_on.iter().find(|f| query.contains(f.as_str())) {
            return Err(ExecError::Query(format!(
                "injected failure on '{fragment}': {query}"
            )));
        }

        let statement = query.trim();
        match statement {
            "BEGIN" => {
                if state.snapshot.is_some() {
                    return Err(ExecError::Query("transaction already open".to_string()));
                }
                state.snapshot = Some(state.committed.clone());
                return Ok(Vec::new());
            }
            "COMMIT" => {
                state.snapshot = None;
                return Ok(Vec::new());
            }
            "ROLLBACK" => {
                if let Some(snapshot) = state.snapshot.take() {
                    state.committed = snapshot;
                }
                return Ok(Vec::new());
            }
            _ => {}
        }

        let book = &mut state.committed;
        if statement.starts_with("CREATE TABLE IF NOT EXISTS schema_migrations") {
            book.table_exists = true;
            return Ok(Vec::new());
        }
        if !statement.contains("schema_migrations") {
            return Ok(Vec::new());
        }
        if !book.table_exists {
            return Err(ExecError::Query("no such table: schema_migrations".to_string()));
        }

        if statement.starts_with("SELECT version, batch") {
            return Ok(book
                .rows
                .iter()
                .map(|(v, b)| Row::new(vec![Value::from(v.as_str()), Value::Int(*b)]))
                .collect());
        }
        if statement.starts_with("SELECT COALESCE(MAX(batch), 0)") {
            let max = book.rows.values().copied().max().unwrap_or(0);
            return Ok(vec![Row::new(vec![Value::Int(max)])]);
        }
        if statement.starts_with("SELECT version FROM") {
            let floor = int_param(params, 0)?;
            let mut selected: Vec<(&String, &i64)> =
                book.rows.iter().filter(|(_, b)| **b > floor).collect();
            selected.sort_by(|a, b| b.1.cmp(a.1).then_with(|| b.0.cmp(a.0)));
            return Ok(selected
                .into_iter()
                .map(|(v, _)| Row::new(vec![Value::from(v.as_str())]))
                .collect());
        }
        if statement.starts_with("INSERT INTO") {
            let version = text_param(params, 0)?;
            let batch = int_param(params, 1)?;
            if book.rows.contains_key(&version) {
                return Err(ExecError::Query(format!(
                    "duplicate key value violates unique constraint: {version}"
                )));
            }
            book.rows.insert(version, batch);
            return Ok(Vec::new());
        }
        if statement.starts_with("DELETE FROM") {
            let version = text_param(params, 0)?;
            book.rows.remove(&version);
            return Ok(Vec::new());
        }
        Err(ExecError::Query(format!("unsupported bookkeeping statement: {statement}")))
    }
}

fn int_param(params: &[Value], index: usize) -> Result<i64, ExecError> {
    match params.get(index) {
        Some(Value::Int(v)) => Ok(*v),
        other => Err(ExecError::Query(format!(
            "expected integer parameter {index}, got {other:?}"
        ))),
    }
}

fn text_param(params: &[Value], index: usize) -> Result<String, ExecError> {
    match params.get(index) {
        Some(Value::Text(v)) => Ok(v.clone()),
        other => Err(ExecError::Query(format!(
            "expected text parameter {index}, got {other:?}"
        ))),
    }
}

impl Executor for MockExecutor {
    fn execute(&self, query: &str, params: &[Value]) -> Result<u64, ExecError> {
        self.run(query, params).map(|rows| rows.len() as u64)
    }

    fn query_all(&self, query: &str, params: &[Value]) -> Result<Vec<Row>, ExecError> {
        self.run(query, params)
    }
}
