//! Configuration management
//!
//! Projects are configured by an optional `stratum.json` in the project
//! directory:
//! ```json
//! {
//!   "database": "app.duckdb",
//!   "migrationsDir": "migrations",
//!   "schemaPath": "schema/baseline.sql",
//!   "archives": ["vendor/plugin-migrations.zip"]
//! }
//! ```
//! Relative paths are resolved against the project directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::adapters::{BASELINE_PATH, MIGRATIONS_DIR};

/// Name of the configuration file inside a project directory
pub const CONFIG_FILE: &str = "stratum.json";

/// Environment variable overriding the database path
pub const DATABASE_ENV: &str = "STRATUM_DATABASE";

const DEFAULT_DATABASE: &str = "stratum.duckdb";

/// Raw stratum.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    migrations_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    archives: Vec<PathBuf>,
}

/// Stratum project configuration with defaults applied
#[derive(Debug, Clone)]
pub struct Config {
    pub project_dir: PathBuf,
    pub database: PathBuf,
    pub migrations_dir: PathBuf,
    pub schema_path: PathBuf,
    pub archives: Vec<PathBuf>,
}

impl Config {
    /// Configuration of a project with no stratum.json
    pub fn defaults(project_dir: &Path) -> Self {
        Self::from_file(project_dir, ConfigFile::default())
    }

    /// Load config from a project directory
    ///
    /// A missing stratum.json means defaults; a malformed one is an error.
    /// The database path can be overridden with STRATUM_DATABASE.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);

        let raw: ConfigFile = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid configuration in {}", config_path.display()))?
        } else {
            ConfigFile::default()
        };

        let mut config = Self::from_file(project_dir, raw);

        if let Some(database) = std::env::var_os(DATABASE_ENV).filter(|v| !v.is_empty()) {
            config.database = project_dir.join(database);
        }

        Ok(config)
    }

    fn from_file(project_dir: &Path, raw: ConfigFile) -> Self {
        let resolve = |path: Option<PathBuf>, default: &str| {
            project_dir.join(path.unwrap_or_else(|| PathBuf::from(default)))
        };

        Self {
            project_dir: project_dir.to_path_buf(),
            database: resolve(raw.database, DEFAULT_DATABASE),
            migrations_dir: resolve(raw.migrations_dir, MIGRATIONS_DIR),
            schema_path: resolve(raw.schema_path, BASELINE_PATH),
            archives: raw
                .archives
                .into_iter()
                .map(|a| project_dir.join(a))
                .collect(),
        }
    }

    /// Save config to the project directory
    ///
    /// Paths inside the project are written relative to it.
    pub fn save(&self) -> Result<()> {
        let relative = |path: &Path| -> PathBuf {
            path.strip_prefix(&self.project_dir)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.to_path_buf())
        };

        let raw = ConfigFile {
            database: Some(relative(&self.database)),
            migrations_dir: Some(relative(&self.migrations_dir)),
            schema_path: Some(relative(&self.schema_path)),
            archives: self.archives.iter().map(|a| relative(a)).collect(),
        };

        let content = serde_json::to_string_pretty(&raw)?;
        std::fs::write(self.project_dir.join(CONFIG_FILE), content)?;
        Ok(())
    }
}
