//! Migration source port - where migrations come from

use crate::domain::result::Result;
use crate::domain::{Catalogue, Migration, Script};

/// A supplier of migrations and, optionally, a baseline schema.
///
/// Implementations (adapters) read from the filesystem, a zip archive, or
/// scripts compiled into the binary. The engine only ever sees this trait.
pub trait MigrationSource {
    /// Human-readable name used in diagnostics
    fn name(&self) -> String;

    /// Every migration this source knows about, in any order
    fn list_migrations(&self) -> Result<Vec<Migration>>;

    /// Script that creates the schema of a fresh database, if any
    fn baseline_schema(&self) -> Result<Option<Script>>;
}

impl<S: MigrationSource + ?Sized> MigrationSource for &S {
    fn name(&self) -> String {
        (**self).name()
    }

    fn list_migrations(&self) -> Result<Vec<Migration>> {
        (**self).list_migrations()
    }

    fn baseline_schema(&self) -> Result<Option<Script>> {
        (**self).baseline_schema()
    }
}

impl<S: MigrationSource + ?Sized> MigrationSource for Box<S> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn list_migrations(&self) -> Result<Vec<Migration>> {
        (**self).list_migrations()
    }

    fn baseline_schema(&self) -> Result<Option<Script>> {
        (**self).baseline_schema()
    }
}

/// Build the version-sorted catalogue of a source, rejecting duplicate versions
pub fn available_migrations(source: &dyn MigrationSource) -> Result<Catalogue> {
    Catalogue::new(source.list_migrations()?, &source.name())
}
