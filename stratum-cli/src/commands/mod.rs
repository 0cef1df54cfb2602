//! CLI command implementations

pub mod bootstrap;
pub mod dump;
pub mod list;
pub mod migrate;
pub mod new;
pub mod status;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use stratum_core::config::Config;
use stratum_core::StratumContext;

/// Resolve the project directory from `--dir`/STRATUM_DIR or the current directory
pub fn project_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().context("Could not determine current directory"),
    }
}

/// Load the project configuration without opening the database
pub fn get_config(project_dir: &Path) -> Result<Config> {
    Config::load(project_dir)
        .with_context(|| format!("Failed to load configuration from {}", project_dir.display()))
}

/// Open the project's database and migration sources
pub fn get_context(project_dir: &Path) -> Result<StratumContext> {
    StratumContext::new(project_dir).context("Failed to initialize stratum context")
}
