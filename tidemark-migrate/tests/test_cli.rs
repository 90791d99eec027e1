//! Tests for argument parsing and command dispatch

#![allow(clippy::expect_used)] // Test code - expect is acceptable

use clap::Parser;
use std::fs;
use tempfile::TempDir;
use tidemark::migration::{FnMigration, Migrator};
use tidemark::test_helpers::MockExecutor;
use tidemark::{DatabaseConfig, Dialect, DialectError};
use tidemark_migrate::{dispatch, execute, resolve_target, Cli, Commands, Target};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("tidemark-migrate").chain(args.iter().copied()))
        .expect("valid arguments")
}

fn migrator() -> Migrator {
    let mut migrator = Migrator::new();
    for version in ["20240101000000", "20240102000000"] {
        let table = format!("t{version}");
        let dropped = table.clone();
        migrator
            .register(FnMigration::new(
                version,
                move |m| {
                    m.create_table(&table, |t| {
                        t.increments("id").primary();
                        Ok(())
                    })
                },
                move |m| m.drop_table(&dropped),
            ))
            .expect("registers");
    }
    migrator
}

#[test]
fn test_parse_global_flags_after_subcommand() {
    let cli = parse(&["up", "--step", "2", "-d", "postgres", "-u", "host=db user=app dbname=app"]);
    assert!(matches!(cli.command, Commands::Up { step: 2 }));
    assert_eq!(cli.driver.as_deref(), Some("postgres"));
    assert_eq!(cli.migrations_dir.to_str(), Some("migrations"));
}

#[test]
fn test_step_defaults() {
    assert!(matches!(parse(&["up"]).command, Commands::Up { step: 0 }));
    assert!(matches!(parse(&["down"]).command, Commands::Down { step: 1 }));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    assert!(Cli::try_parse_from(["tidemark-migrate", "-v", "-q", "status"]).is_err());
}

#[test]
fn test_flags_skip_configuration() {
    let cli = parse(&["status", "--driver", "mysql", "--dsn", "root:pw@tcp(db:3306)/app"]);
    let target = resolve_target(&cli, || -> Result<DatabaseConfig, DialectError> {
        panic!("configuration must not be loaded")
    })
    .expect("resolves");
    assert_eq!(
        target,
        Target {
            dialect: Dialect::Mysql,
            dsn: "root:pw@tcp(db:3306)/app".to_string(),
        }
    );
}

#[test]
fn test_configuration_fills_missing_flags() {
    let cli = parse(&["status", "--driver", "postgres"]);
    let target = resolve_target(&cli, || -> Result<DatabaseConfig, DialectError> {
        Ok(DatabaseConfig {
            host: "localhost".into(),
            username: "app".into(),
            database: "app_dev".into(),
            ..DatabaseConfig::default()
        })
    })
    .expect("resolves");
    assert_eq!(target.dialect, Dialect::Postgres);
    assert_eq!(target.dsn, "host=localhost port=5432 user=app dbname=app_dev");
}

#[test]
fn test_missing_driver_is_an_error() {
    let cli = parse(&["status"]);
    let result = resolve_target(&cli, || -> Result<DatabaseConfig, DialectError> {
        Ok(DatabaseConfig::default())
    });
    assert!(result.is_err());
}

#[test]
fn test_create_scaffolds_file() {
    let dir = TempDir::new().expect("temp dir");
    let migrations_dir = dir.path().join("migrations");
    let cli = parse(&[
        "create",
        "add_email_to_users",
        "--migrations-dir",
        migrations_dir.to_str().expect("utf-8 path"),
    ]);

    execute(cli, Migrator::new()).expect("scaffolds");

    let files: Vec<_> = fs::read_dir(&migrations_dir)
        .expect("directory created")
        .map(|e| e.expect("entry").file_name().into_string().expect("utf-8"))
        .collect();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with('m'));
    assert!(files[0].ends_with("_add_email_to_users.rs"));
}

#[test]
fn test_create_rejects_bad_name() {
    let dir = TempDir::new().expect("temp dir");
    let cli = parse(&[
        "create",
        "AddEmail",
        "--migrations-dir",
        dir.path().to_str().expect("utf-8 path"),
    ]);
    assert!(execute(cli, Migrator::new()).is_err());
}

#[test]
fn test_dispatch_up_down_status() {
    let executor = MockExecutor::new();

    dispatch(&Commands::Up { step: 0 }, migrator(), &executor, Dialect::Sqlite).expect("up");
    assert_eq!(executor.applied().len(), 2);

    dispatch(&Commands::Status, migrator(), &executor, Dialect::Sqlite).expect("status");

    dispatch(&Commands::Down { step: 1 }, migrator(), &executor, Dialect::Sqlite).expect("down");
    assert!(executor.applied().is_empty());
}
