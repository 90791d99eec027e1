//! Database configuration
//!
//! Sources, lowest precedence first:
//! 1. `config/config.toml`, section `[database]` (optional)
//! 2. `TIDEMARK__DATABASE__*` environment variables
//! 3. `DB_DRIVER`, `DB_HOST`, `DB_PORT`, `DB_USERNAME`, `DB_PASSWORD`,
//!    `DB_DATABASE`, `DB_PARAMS` and `DATABASE_URL`, used only for fields the
//!    first two sources left empty

use crate::dialect::{Dialect, DialectError};
use crate::dsn::{DataSource, DsnError};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "TIDEMARK";

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub driver: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub params: String,
    /// Full connection string; when set it wins over the discrete fields.
    #[serde(default)]
    pub url: String,
}

impl DatabaseConfig {
    /// Load the database configuration from `config/config.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(env_source());

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!("failed to load {CONFIG_FILE}, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(env_source())
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        let mut db_config = Self::from_settings(&settings)?;
        db_config.fill_from(|key| std::env::var(key).ok())?;
        Ok(db_config)
    }

    /// Read the `database` section, or defaults when it is absent.
    pub fn from_settings(settings: &Config) -> Result<Self, ConfigError> {
        match settings.get::<DatabaseConfig>("database") {
            Ok(db_config) => Ok(db_config),
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            Err(e) => Err(ConfigError::Message(format!(
                "Database configuration is invalid: {e}"
            ))),
        }
    }

    /// Fill empty fields from the conventional `DB_*` / `DATABASE_URL` variables.
    pub fn fill_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fill = |field: &mut String, key: &str| {
            if field.is_empty() {
                if let Some(value) = lookup(key) {
                    *field = value;
                }
            }
        };
        fill(&mut self.driver, "DB_DRIVER");
        fill(&mut self.host, "DB_HOST");
        fill(&mut self.username, "DB_USERNAME");
        fill(&mut self.password, "DB_PASSWORD");
        fill(&mut self.database, "DB_DATABASE");
        fill(&mut self.params, "DB_PARAMS");
        fill(&mut self.url, "DATABASE_URL");

        if self.port.is_none() {
            if let Some(port) = lookup("DB_PORT").filter(|p| !p.is_empty()) {
                let port = port
                    .trim()
                    .parse::<u16>()
                    .map_err(|e| ConfigError::Message(format!("DB_PORT '{port}': {e}")))?;
                self.port = Some(port);
            }
        }
        Ok(())
    }

    pub fn dialect(&self) -> Result<Dialect, DialectError> {
        self.driver.parse()
    }

    /// Connection string: `url` when set, otherwise built from the discrete fields.
    pub fn dsn(&self) -> Result<String, DsnError> {
        if !self.url.is_empty() {
            return Ok(self.url.clone());
        }
        self.data_source().to_dsn()
    }

    pub fn data_source(&self) -> DataSource {
        DataSource {
            dialect: self.driver.clone(),
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            password: self.password.clone(),
            name: self.database.clone(),
            params: self.params.clone(),
        }
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
#[allow(clippy::expect_used)] // Test code - expect is acceptable
mod tests {
    use super::*;
    use config::FileFormat;
    use std::collections::HashMap;

    fn settings(toml: &str) -> Config {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .expect("valid toml")
    }

    #[test]
    fn test_reads_database_section() {
        let cfg = DatabaseConfig::from_settings(&settings(
            r#"
            [database]
            driver = "postgres"
            host = "localhost"
            port = 5433
            username = "app"
            database = "app_dev"
            "#,
        ))
        .expect("loads");
        assert_eq!(cfg.dialect(), Ok(Dialect::Postgres));
        assert_eq!(
            cfg.dsn().expect("dsn"),
            "host=localhost port=5433 user=app dbname=app_dev"
        );
    }

    #[test]
    fn test_missing_section_defaults() {
        let cfg = DatabaseConfig::from_settings(&settings("")).expect("loads");
        assert_eq!(cfg, DatabaseConfig::default());
        assert_eq!(cfg.dialect(), Err(DialectError::Unset));
    }

    #[test]
    fn test_fill_from_env_only_fills_gaps() {
        let env: HashMap<&str, &str> = [
            ("DB_DRIVER", "mysql"),
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "3307"),
            ("DB_USERNAME", "root"),
            ("DB_DATABASE", "ignored"),
        ]
        .into_iter()
        .collect();

        let mut cfg = DatabaseConfig {
            database: "shop".into(),
            ..DatabaseConfig::default()
        };
        cfg.fill_from(|k| env.get(k).map(|v| v.to_string()))
            .expect("fills");

        assert_eq!(cfg.database, "shop");
        assert_eq!(cfg.port, Some(3307));
        assert_eq!(cfg.dsn().expect("dsn"), "root:@tcp(db.internal:3307)/shop");
    }

    #[test]
    fn test_url_wins() {
        let mut cfg = DatabaseConfig::default();
        cfg.fill_from(|k| (k == "DATABASE_URL").then(|| "postgres://u:p@h/db".to_string()))
            .expect("fills");
        assert_eq!(cfg.dsn().expect("dsn"), "postgres://u:p@h/db");
    }

    #[test]
    fn test_bad_port_is_rejected() {
        let mut cfg = DatabaseConfig::default();
        let result = cfg.fill_from(|k| (k == "DB_PORT").then(|| "abc".to_string()));
        assert!(result.is_err());
    }
}
