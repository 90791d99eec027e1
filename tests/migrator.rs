//! Migration engine behaviour against the in-memory executor.

#![allow(clippy::expect_used)] // Test code - expect is acceptable

use tidemark::migration::{FnMigration, MigrationError, Migrator};
use tidemark::test_helpers::MockExecutor;
use tidemark::Dialect;

const VERSIONS: [&str; 5] = [
    "20240101000001",
    "20240101000002",
    "20240101000003",
    "20240101000004",
    "20240101000005",
];

fn table_for(version: &str) -> String {
    format!("t{}", &version[version.len() - 1..])
}

fn migrator() -> Migrator {
    let mut migrator = Migrator::new();
    // Registered out of order on purpose; the engine sorts by version.
    for version in VERSIONS.iter().rev() {
        let up_table = table_for(version);
        let down_table = up_table.clone();
        migrator
            .register(
                FnMigration::new(
                    *version,
                    move |m| {
                        m.create_table(&up_table, |t| {
                            t.increments("id").primary();
                            Ok(())
                        })
                    },
                    move |m| m.drop_table(&down_table),
                )
                .with_name(format!("create_{}", table_for(version))),
            )
            .expect("registers");
    }
    migrator
}

fn position(executor: &MockExecutor, fragment: &str) -> usize {
    executor
        .statements()
        .iter()
        .position(|s| s.contains(fragment))
        .expect("statement was issued")
}

#[test]
fn test_up_applies_each_migration_once() {
    let executor = MockExecutor::new();
    let mut migrator = migrator();
    migrator.init(&executor, Dialect::Postgres).expect("init");

    assert_eq!(migrator.up(&executor, 0).expect("up"), 5);
    assert_eq!(migrator.up(&executor, 0).expect("second up"), 0);

    for version in VERSIONS {
        let create = format!("CREATE TABLE {} ", table_for(version));
        assert_eq!(executor.count_matching(&create), 1, "{version}");
    }
    assert!(position(&executor, "CREATE TABLE t1 ") < position(&executor, "CREATE TABLE t5 "));
}

#[test]
fn test_batches_and_down() {
    let executor = MockExecutor::new();
    let mut migrator = migrator();
    migrator.init(&executor, Dialect::Sqlite).expect("init");

    assert_eq!(migrator.up(&executor, 2).expect("first batch"), 2);
    assert_eq!(migrator.up(&executor, 0).expect("second batch"), 3);
    assert_eq!(
        executor.applied(),
        [
            (VERSIONS[0].to_string(), 1),
            (VERSIONS[1].to_string(), 1),
            (VERSIONS[2].to_string(), 2),
            (VERSIONS[3].to_string(), 2),
            (VERSIONS[4].to_string(), 2),
        ]
    );

    assert_eq!(migrator.down(&executor, 1).expect("down"), 3);
    assert_eq!(
        executor.applied(),
        [(VERSIONS[0].to_string(), 1), (VERSIONS[1].to_string(), 1)]
    );

    // Reverted newest first.
    assert!(position(&executor, "DROP TABLE t5;") < position(&executor, "DROP TABLE t4;"));
    assert!(position(&executor, "DROP TABLE t4;") < position(&executor, "DROP TABLE t3;"));
    assert_eq!(executor.count_matching("DROP TABLE t2;"), 0);

    let status = migrator.status();
    assert_eq!(status.applied_count, 2);
    assert_eq!(status.next_pending_version(), Some(VERSIONS[2]));
}

#[test]
fn test_failed_batch_is_rolled_back() {
    let executor = MockExecutor::new();
    let mut migrator = migrator();
    migrator.init(&executor, Dialect::Mysql).expect("init");

    executor.fail_on("CREATE TABLE t3 ");
    let err = migrator.up(&executor, 0).expect_err("third migration fails");
    assert!(matches!(err, MigrationError::Database(_)));

    assert!(executor.applied().is_empty());
    assert!(!executor.in_transaction());
    assert_eq!(executor.count_matching("ROLLBACK"), 1);
    assert_eq!(migrator.status().pending_count, 5);

    executor.clear_failures();
    assert_eq!(migrator.up(&executor, 0).expect("retry"), 5);
    assert!(executor.applied().iter().all(|(_, batch)| *batch == 1));
}

#[test]
fn test_failed_down_restores_batch() {
    let executor = MockExecutor::new();
    let mut migrator = migrator();
    migrator.init(&executor, Dialect::Sqlite).expect("init");
    migrator.up(&executor, 3).expect("batch 1");
    assert_eq!(migrator.up(&executor, 0).expect("batch 2"), 2);

    executor.fail_on("DROP TABLE t4;");
    let err = migrator.down(&executor, 1).expect_err("second revert fails");
    assert!(matches!(err, MigrationError::Database(_)));

    // t5 was reverted first, then its bookkeeping row came back with the rollback.
    assert_eq!(executor.count_matching("DROP TABLE t5;"), 1);
    assert_eq!(executor.count_matching("ROLLBACK"), 1);
    assert!(!executor.in_transaction());
    assert_eq!(
        executor.applied(),
        [
            (VERSIONS[0].to_string(), 1),
            (VERSIONS[1].to_string(), 1),
            (VERSIONS[2].to_string(), 1),
            (VERSIONS[3].to_string(), 2),
            (VERSIONS[4].to_string(), 2),
        ]
    );

    let status = migrator.status();
    assert_eq!(status.applied_count, 5);
    assert_eq!(status.latest_applied_version(), Some(VERSIONS[4]));

    executor.clear_failures();
    assert_eq!(migrator.down(&executor, 1).expect("retry"), 2);
    assert_eq!(executor.applied().len(), 3);
}

#[test]
fn test_oversized_down_reverts_everything() {
    let executor = MockExecutor::new();
    let mut migrator = migrator();
    migrator.init(&executor, Dialect::Postgres).expect("init");
    migrator.up(&executor, 1).expect("batch 1");
    migrator.up(&executor, 1).expect("batch 2");
    migrator.up(&executor, 1).expect("batch 3");

    assert_eq!(migrator.down(&executor, 10).expect("down"), 3);
    assert!(executor.applied().is_empty());
    assert!(migrator.status().applied().next().is_none());
}

#[test]
fn test_init_picks_up_existing_bookkeeping() {
    let executor = MockExecutor::new();
    let mut first = migrator();
    first.init(&executor, Dialect::Postgres).expect("init");
    first.up(&executor, 3).expect("up");

    let mut second = migrator();
    second.init(&executor, Dialect::Postgres).expect("init");
    let status = second.status();
    assert_eq!(status.applied_count, 3);
    assert_eq!(status.latest_applied_version(), Some(VERSIONS[2]));

    executor.clear_statements();
    assert_eq!(second.up(&executor, 0).expect("up"), 2);
    assert_eq!(executor.count_matching("CREATE TABLE t1 "), 0);
}

#[test]
fn test_unregistered_applied_version_blocks_down() {
    let executor = MockExecutor::new();
    executor.seed_applied("20231231000000", 1);

    let mut migrator = migrator();
    migrator.init(&executor, Dialect::Sqlite).expect("init");

    let err = migrator.down(&executor, 1).expect_err("drifted bookkeeping");
    assert!(matches!(err, MigrationError::Consistency { ref version } if version == "20231231000000"));
    assert_eq!(executor.applied(), [("20231231000000".to_string(), 1)]);
}
