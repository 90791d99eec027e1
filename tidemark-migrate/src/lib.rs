//! Tidemark Migration CLI
//!
//! Applications register their migrations on a [`Migrator`] and hand it to
//! [`run`] from their own `main`:
//!
//! ```rust,no_run
//! use tidemark::migration::{FnMigration, Migrator};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut migrator = Migrator::new();
//!     migrator.register(FnMigration::new(
//!         "20240101000000",
//!         |m| m.create_table("users", |t| {
//!             t.increments("id").primary();
//!             Ok(())
//!         }),
//!         |m| m.drop_table("users"),
//!     ))?;
//!     tidemark_migrate::run(migrator)
//! }
//! ```

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tidemark::migration::{create_migration_file, Migrator};
use tidemark::{DatabaseConfig, Dialect, Executor};

#[derive(Debug, Parser)]
#[command(name = "tidemark-migrate")]
#[command(about = "Migration management tool for Tidemark")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Database driver: sqlite, mysql or postgres
    #[arg(short = 'd', long, global = true)]
    pub driver: Option<String>,

    /// Connection string for the driver
    #[arg(short = 'u', long, global = true)]
    pub dsn: Option<String>,

    /// Directory scaffolded migration files are written to
    #[arg(long, default_value = "migrations", global = true)]
    pub migrations_dir: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate a new migration file
    Create {
        /// Migration name in snake case (e.g. "create_users_table")
        name: String,
    },

    /// Apply pending migrations as one batch
    Up {
        /// Number of migrations to apply (default: all pending)
        #[arg(long, default_value_t = 0)]
        step: usize,
    },

    /// Roll back the most recent batches
    Down {
        /// Number of batches to roll back
        #[arg(long, default_value_t = 1)]
        step: usize,
    },

    /// Show migration status (applied vs pending)
    Status,
}

/// Where to connect: resolved from flags first, then configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub dialect: Dialect,
    pub dsn: String,
}

/// Parse the command line and run it against `migrator`.
pub fn run(migrator: Migrator) -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli);
    execute(cli, migrator)
}

/// Run an already-parsed command line.
pub fn execute(cli: Cli, migrator: Migrator) -> Result<()> {
    if let Commands::Create { name } = &cli.command {
        return handle_create(&cli.migrations_dir, name);
    }

    let target = resolve_target(&cli, DatabaseConfig::load)?;
    log::debug!("connecting with driver {}", target.dialect);
    let executor = tidemark::connect(target.dialect, &target.dsn)
        .with_context(|| format!("failed to connect to {} database", target.dialect))?;
    dispatch(&cli.command, migrator, executor.as_ref(), target.dialect)
}

/// Run `up`, `down` or `status` against an open executor.
///
/// Applications that bring their own driver call this directly with their
/// [`Executor`] implementation.
pub fn dispatch(
    command: &Commands,
    mut migrator: Migrator,
    executor: &dyn Executor,
    dialect: Dialect,
) -> Result<()> {
    if let Commands::Create { name } = command {
        return Err(anyhow!("'create {name}' does not need a database connection"));
    }
    migrator
        .init(executor, dialect)
        .context("failed to initialize migrator")?;

    match command {
        Commands::Create { .. } => Ok(()),
        Commands::Up { step } => handle_up(&mut migrator, executor, *step),
        Commands::Down { step } => handle_down(&mut migrator, executor, *step),
        Commands::Status => {
            handle_status(&migrator);
            Ok(())
        }
    }
}

/// Pick driver and DSN: command-line flags win, `load_config` fills the gaps.
///
/// `load_config` is only called when a flag is missing.
pub fn resolve_target<F, E>(cli: &Cli, load_config: F) -> Result<Target>
where
    F: FnOnce() -> std::result::Result<DatabaseConfig, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    let config = if cli.driver.is_some() && cli.dsn.is_some() {
        DatabaseConfig::default()
    } else {
        load_config().context("failed to load database configuration")?
    };

    let driver = cli.driver.clone().unwrap_or_else(|| config.driver.clone());
    let dialect: Dialect = driver
        .parse()
        .context("no usable driver; pass --driver or set DB_DRIVER")?;

    let dsn = match &cli.dsn {
        Some(dsn) => dsn.clone(),
        None => config
            .dsn()
            .context("no usable DSN; pass --dsn or configure the database")?,
    };
    Ok(Target { dialect, dsn })
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn handle_create(migrations_dir: &Path, name: &str) -> Result<()> {
    let file = create_migration_file(migrations_dir, name, Utc::now())?;
    println!(
        "{} Generated migration: {}",
        "✓".green(),
        file.path.display()
    );
    println!("   Implement up() and down(), then register it with your Migrator");
    Ok(())
}

fn handle_up(migrator: &mut Migrator, executor: &dyn Executor, step: usize) -> Result<()> {
    println!("Applying migrations...");
    let applied = migrator.up(executor, step)?;

    if applied > 0 {
        println!(
            "{} Successfully applied {} migration(s)",
            "✓".green(),
            applied
        );
    } else {
        println!("{} No migrations to apply", "✓".green());
    }
    Ok(())
}

fn handle_down(migrator: &mut Migrator, executor: &dyn Executor, step: usize) -> Result<()> {
    println!("Rolling back migrations...");
    let rolled_back = migrator.down(executor, step)?;

    if rolled_back > 0 {
        println!(
            "{} Successfully rolled back {} migration(s)",
            "✓".green(),
            rolled_back
        );
    } else {
        println!("{} No migrations to roll back", "✓".green());
    }
    Ok(())
}

fn handle_status(migrator: &Migrator) {
    let status = migrator.status();

    println!("\n{}\n", "Migration Status".bold());
    for state in &status.migrations {
        let marker = if state.applied {
            "applied".green()
        } else {
            "pending".yellow()
        };
        println!("  [{marker}] {} {}", state.version, state.name);
    }
    if status.migrations.is_empty() {
        println!("  No migrations registered");
    }

    println!(
        "\nSummary: {} applied, {} pending",
        status.applied_count, status.pending_count
    );
    if let Some(next) = status.next_pending_version() {
        println!("Next pending version: {next}");
    }
}
