//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - Scripts compiled into the binary for MigrationSource
//! - A project directory on disk for MigrationSource
//! - A zip archive for MigrationSource
//! - DuckDB connections for the database the migrations run against

mod archive;
mod composite;
mod directory;
pub mod duckdb;
mod embedded;

pub use archive::ArchiveSource;
pub use composite::CompositeSource;
pub use directory::DirectorySource;
pub use embedded::EmbeddedSource;

/// Directory holding migration scripts, relative to a project or archive root
pub const MIGRATIONS_DIR: &str = "migrations";

/// Baseline schema script, relative to a project or archive root
pub const BASELINE_PATH: &str = "schema/baseline.sql";

/// Extension of migration scripts
pub const MIGRATION_EXT: &str = "sql";
