//! Tidemark Migration CLI Tool
//!
//! Ships with a small sample set of migrations. Applications build their own
//! binary around [`tidemark_migrate::run`] with their registered migrations.

mod migrations;

use colored::Colorize;
use std::process;
use tidemark::migration::Migrator;

fn main() {
    let mut migrator = Migrator::new();
    if let Err(e) = migrations::register(&mut migrator) {
        eprintln!("{} {e}", "Error:".red());
        process::exit(1);
    }

    if let Err(e) = tidemark_migrate::run(migrator) {
        eprintln!("{} {e:#}", "Error:".red());
        process::exit(1);
    }
}
