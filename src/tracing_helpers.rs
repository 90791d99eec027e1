//! `tracing` spans for statements, transactions and migration batches.

use tracing::Span;

const STATEMENT_PREVIEW: usize = 120;

fn preview(query: &str) -> &str {
    match query.char_indices().nth(STATEMENT_PREVIEW) {
        Some((end, _)) => &query[..end],
        None => query,
    }
}

pub(crate) fn execute_query_span(query: &str) -> Span {
    tracing::debug_span!("tidemark.execute", db.statement = preview(query))
}

pub(crate) fn begin_transaction_span() -> Span {
    tracing::debug_span!("tidemark.transaction.begin")
}

pub(crate) fn commit_transaction_span() -> Span {
    tracing::debug_span!("tidemark.transaction.commit")
}

pub(crate) fn rollback_transaction_span() -> Span {
    tracing::debug_span!("tidemark.transaction.rollback")
}

pub(crate) fn acquire_connection_span() -> Span {
    tracing::info_span!("tidemark.connect")
}

/// One `up` or `down` invocation.
pub(crate) fn migration_batch_span(direction: &'static str, dialect: &'static str) -> Span {
    tracing::info_span!("tidemark.migrate", direction, dialect)
}

pub(crate) fn migration_span(version: &str) -> Span {
    tracing::info_span!("tidemark.migration", version)
}
