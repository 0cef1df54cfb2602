//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The migration
//! engine depends only on these traits, not on concrete implementations.

mod migration_source;

pub use migration_source::{available_migrations, MigrationSource};
