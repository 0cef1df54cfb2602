//! Stratum Core - Versioned schema migrations for DuckDB
//!
//! This crate implements the migration engine following hexagonal architecture:
//!
//! - **domain**: Core entities (Migration, Catalogue, Script)
//! - **ports**: Trait definitions for external dependencies (MigrationSource)
//! - **services**: Migration orchestration (apply, status, validate, dump)
//! - **adapters**: Concrete implementations (directories, zip archives, DuckDB)

pub mod domain;
pub mod ports;
pub mod services;
pub mod adapters;
pub mod config;

use std::path::Path;

use anyhow::{Context, Result};
use duckdb::Connection;

use adapters::duckdb::open_database;
use adapters::{ArchiveSource, CompositeSource, DirectorySource};
use config::Config;
use services::*;

// Re-export commonly used types at crate root
pub use domain::{Catalogue, Migration, Script, Version};
pub use domain::result::Error;
pub use ports::{available_migrations, MigrationSource};

/// Main context for Stratum operations
///
/// Holds the project configuration, the database connection, and the
/// migration source the configuration describes: the project's migrations
/// directory and baseline schema, followed by every configured archive.
pub struct StratumContext {
    pub config: Config,
    pub conn: Connection,
    pub source: CompositeSource,
}

impl StratumContext {
    /// Create a new Stratum context for a project directory
    pub fn new(project_dir: &Path) -> Result<Self> {
        let config = Config::load(project_dir)?;
        Self::from_config(config)
    }

    /// Create a context from an already loaded configuration
    pub fn from_config(config: Config) -> Result<Self> {
        if let Some(parent) = config.database.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let conn = open_database(&config.database)
            .with_context(|| format!("Failed to open {}", config.database.display()))?;

        let source = Self::source_for(&config);
        tracing::debug!(
            database = %config.database.display(),
            source = %source.name(),
            "opened project"
        );

        Ok(Self {
            config,
            conn,
            source,
        })
    }

    /// Migration source described by a configuration
    pub fn source_for(config: &Config) -> CompositeSource {
        let mut source = CompositeSource::new().with_source(
            DirectorySource::new(&config.migrations_dir).with_baseline(&config.schema_path),
        );
        for archive in &config.archives {
            source.push(Box::new(ArchiveSource::new(archive)));
        }
        source
    }

    pub fn migration_service(&self) -> MigrationService<'_> {
        MigrationService::new(&self.conn)
    }

    pub fn dump_service(&self) -> DumpService<'_> {
        DumpService::new(&self.conn)
    }

    /// Apply every pending migration
    pub fn migrate(&self) -> Result<MigrationResult> {
        Ok(self.migration_service().apply_pending(&self.source)?)
    }

    /// Apply pending migrations up to and including `target`
    pub fn migrate_to(&self, target: Option<Version>) -> Result<MigrationResult> {
        Ok(self.migration_service().apply_pending_to(&self.source, target)?)
    }

    pub fn status(&self) -> Result<MigrationStatus> {
        Ok(self.migration_service().status(&self.source)?)
    }

    pub fn bootstrap(&self) -> Result<bool> {
        Ok(self.migration_service().bootstrap(&self.source)?)
    }

    /// Catalogue of every migration the project knows about
    pub fn catalogue(&self) -> Result<Catalogue> {
        Ok(available_migrations(&self.source)?)
    }
}
