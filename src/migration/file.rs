//! Migration file scaffolding
//!
//! Scaffolded files are named `m{YYYYMMDDHHMMSS}_{name}.rs` and contain a
//! [`Migration`](super::Migration) skeleton. The application still registers
//! them with its [`Migrator`](super::Migrator); files are never loaded at
//! runtime.

use super::error::MigrationError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

static MIGRATION_NAME: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"^[a-z0-9_]+$"));

fn compiled(pattern: &'static Lazy<Result<Regex, regex::Error>>) -> Result<&'static Regex, MigrationError> {
    pattern
        .as_ref()
        .map_err(|e| MigrationError::InvalidName(format!("invalid pattern: {e}")))
}

/// A scaffolded migration file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub path: PathBuf,
    /// Timestamp version, `YYYYMMDDHHMMSS`.
    pub version: String,
    pub name: String,
}

/// Check that `name` is snake case: lowercase letters, digits and underscores.
///
/// # Errors
///
/// Returns `MigrationError::InvalidName` otherwise.
pub fn validate_migration_name(name: &str) -> Result<(), MigrationError> {
    if compiled(&MIGRATION_NAME)?.is_match(name) {
        Ok(())
    } else {
        Err(MigrationError::InvalidName(name.to_string()))
    }
}

/// Write a new migration skeleton into `dir`, creating the directory if needed.
///
/// # Errors
///
/// Returns `MigrationError::InvalidName` for a bad name, or
/// `MigrationError::Io` if the directory or file cannot be written. An
/// existing file is never overwritten.
pub fn create_migration_file(
    dir: &Path,
    name: &str,
    now: DateTime<Utc>,
) -> Result<MigrationFile, MigrationError> {
    validate_migration_name(name)?;
    fs::create_dir_all(dir)?;

    let version = now.format("%Y%m%d%H%M%S").to_string();
    let path = dir.join(format!("m{version}_{name}.rs"));
    let contents = render_template(&version, name, now);

    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .and_then(|mut file| std::io::Write::write_all(&mut file, contents.as_bytes()))?;

    log::info!("created migration {}", path.display());
    Ok(MigrationFile {
        path,
        version,
        name: name.to_string(),
    })
}

fn render_template(version: &str, name: &str, now: DateTime<Utc>) -> String {
    let type_name = pascal_case(name);
    format!(
        r#"//! Migration: {name}
//! Version: {version}
//! Generated: {generated}

use tidemark::migration::{{Migration, MigrationError, SchemaManager}};

pub struct {type_name};

impl Migration for {type_name} {{
    fn version(&self) -> &str {{
        "{version}"
    }}

    fn name(&self) -> &str {{
        "{name}"
    }}

    fn up(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {{
        manager.create_table("example", |t| {{
            t.increments("id").primary();
            t.timestamps();
            Ok(())
        }})
    }}

    fn down(&self, manager: &SchemaManager<'_>) -> Result<(), MigrationError> {{
        manager.drop_table("example")
    }}
}}
"#,
        generated = now.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

fn pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    for part in name.split('_').filter(|p| !p.is_empty()) {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    if out.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        out.insert(0, 'M');
    }
    out
}
