//! Migration service - reconciles a database with a migration catalogue
//!
//! Applied versions are tracked in the `schema_migrations` table. A database
//! bootstrapped from a baseline schema records the versions that baseline
//! contains; the lowest of them is the origin version, and no migration at or
//! below it is ever run against that database. Everything above the origin
//! that has no row yet is pending.
//!
//! A run reads the state, decides, and applies inside one transaction, so a
//! failing migration leaves no trace of the run at all.

use std::collections::BTreeSet;

use duckdb::Connection;
use serde::Serialize;

use crate::adapters::duckdb::{open_in_memory, with_rollback, with_transaction};
use crate::domain::result::Result;
use crate::domain::{Catalogue, Migration, Version};
use crate::ports::{available_migrations, MigrationSource};
use crate::services::SchemaState;

/// A migration as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    pub version: Version,
    pub description: String,
    pub name: String,
}

impl From<&Migration> for MigrationSummary {
    fn from(migration: &Migration) -> Self {
        Self {
            version: migration.version(),
            description: migration.description().to_string(),
            name: migration.name().to_string(),
        }
    }
}

/// Result of running migrations
#[derive(Debug, Serialize)]
pub struct MigrationResult {
    /// Newly applied migrations, in the order they ran
    pub applied: Vec<MigrationSummary>,
    /// Origin version the run reconciled against
    pub origin_version: Option<Version>,
    /// Whether this run created the bookkeeping table
    pub bootstrapped: bool,
}

impl MigrationResult {
    pub fn applied_count(&self) -> usize {
        self.applied.len()
    }
}

/// Where a database stands relative to a catalogue
#[derive(Debug, Serialize)]
pub struct MigrationStatus {
    /// Whether the bookkeeping table exists.
    ///
    /// When it does not, the versions below describe the database as it will
    /// be right after bootstrapping.
    pub bootstrapped: bool,
    pub origin_version: Option<Version>,
    pub current_version: Option<Version>,
    /// Highest version in the catalogue
    pub latest_version: Option<Version>,
    pub applied_count: usize,
    pub pending: Vec<MigrationSummary>,
}

impl MigrationStatus {
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Outcome of validating a source
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub migrations: usize,
    pub statements: usize,
    /// Statement count of the baseline, if the source has one
    pub baseline_statements: Option<usize>,
}

/// Whether a migration still has to run on a database with this origin and
/// applied set
fn is_pending(version: Version, origin: Option<Version>, applied: &BTreeSet<Version>) -> bool {
    if origin.is_some_and(|origin| version <= origin) {
        return false;
    }
    !applied.contains(&version)
}

/// Service for managing database migrations
pub struct MigrationService<'a> {
    conn: &'a Connection,
}

impl<'a> MigrationService<'a> {
    /// Create a new migration service with a database connection
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Run all pending migrations
    ///
    /// This is the main entry point. Inside a single transaction it:
    /// 1. Reads the origin version, bootstrapping the database first if the
    ///    bookkeeping table does not exist (retried once, after bootstrap)
    /// 2. Reads the applied versions
    /// 3. Applies every catalogued migration above the origin that is not
    ///    applied yet, in version order, recording each
    ///
    /// Any failure rolls the whole run back. Running it again without new
    /// migrations applies nothing.
    pub fn apply_pending(&self, source: &dyn MigrationSource) -> Result<MigrationResult> {
        self.apply_pending_to(source, None)
    }

    /// Run pending migrations up to and including `target`, or all of them
    /// if `target` is `None`
    pub fn apply_pending_to(
        &self,
        source: &dyn MigrationSource,
        target: Option<Version>,
    ) -> Result<MigrationResult> {
        // Enumerate before touching the database
        let catalogue = available_migrations(source)?;

        with_transaction(self.conn, |conn| {
            let state = SchemaState::new(conn);

            let (origin, bootstrapped) = match state.origin_version() {
                Ok(origin) => (origin, false),
                Err(e) if e.is_not_bootstrapped() => {
                    let baseline = source.baseline_schema()?;
                    let bootstrapped = state.bootstrap(baseline.as_ref())?;
                    (state.origin_version()?, bootstrapped)
                }
                Err(e) => return Err(e),
            };
            let applied_versions = state.applied_versions()?;

            let mut applied = Vec::new();
            for migration in &catalogue {
                let version = migration.version();
                if target.is_some_and(|target| version > target) {
                    break;
                }
                if !is_pending(version, origin, &applied_versions) {
                    tracing::debug!(version, migration = migration.name(), "skipping migration");
                    continue;
                }

                tracing::info!(version, migration = migration.name(), "applying migration");
                state.apply(migration)?;
                applied.push(MigrationSummary::from(migration));
            }

            Ok(MigrationResult {
                applied,
                origin_version: origin,
                bootstrapped,
            })
        })
        .inspect_err(|e| tracing::warn!(source = %source.name(), "migration run rolled back: {}", e))
    }

    /// Create the bookkeeping table and load the source's baseline, without
    /// applying any migration
    pub fn bootstrap(&self, source: &dyn MigrationSource) -> Result<bool> {
        let baseline = source.baseline_schema()?;
        with_transaction(self.conn, |conn| {
            SchemaState::new(conn).bootstrap(baseline.as_ref())
        })
    }

    /// Report where the database stands, changing nothing
    pub fn status(&self, source: &dyn MigrationSource) -> Result<MigrationStatus> {
        let catalogue = available_migrations(source)?;
        let bootstrapped = SchemaState::new(self.conn).is_bootstrapped()?;
        let baseline = if bootstrapped {
            None
        } else {
            source.baseline_schema()?
        };

        // Bootstrap inside a transaction that is thrown away, so a fresh
        // database reports exactly what the next run would do
        with_rollback(self.conn, |conn| {
            let state = SchemaState::new(conn);
            if !bootstrapped {
                state.bootstrap(baseline.as_ref())?;
            }

            let origin = state.origin_version()?;
            let applied_versions = state.applied_versions()?;

            Ok(MigrationStatus {
                bootstrapped,
                origin_version: origin,
                current_version: state.current_version()?,
                latest_version: catalogue.latest_version(),
                applied_count: applied_versions.len(),
                pending: pending_in(&catalogue, origin, &applied_versions),
            })
        })
    }

    /// Migrations the next run would apply
    pub fn pending(&self, source: &dyn MigrationSource) -> Result<Vec<MigrationSummary>> {
        Ok(self.status(source)?.pending)
    }

    /// Check that a source is usable before shipping it.
    ///
    /// Every script must parse, the baseline must load into an empty
    /// database, and the full catalogue must apply in order to another one.
    pub fn validate(source: &dyn MigrationSource) -> Result<ValidationReport> {
        let catalogue = available_migrations(source)?;

        let mut statements = 0;
        for migration in &catalogue {
            statements += migration.script()?.parse()?.len();
        }

        let baseline = source.baseline_schema()?;
        let baseline_statements = match &baseline {
            Some(script) => {
                let count = script.parse()?.len();
                let conn = open_in_memory()?;
                with_transaction(&conn, |conn| SchemaState::new(conn).bootstrap(Some(script)))?;
                Some(count)
            }
            None => None,
        };

        let conn = open_in_memory()?;
        with_transaction(&conn, |conn| {
            let state = SchemaState::new(conn);
            state.bootstrap(None)?;
            for migration in &catalogue {
                state.apply(migration)?;
            }
            Ok(())
        })?;

        tracing::info!(
            migrations = catalogue.len(),
            statements,
            "validated {}",
            source.name()
        );

        Ok(ValidationReport {
            migrations: catalogue.len(),
            statements,
            baseline_statements,
        })
    }
}

fn pending_in(
    catalogue: &Catalogue,
    origin: Option<Version>,
    applied: &BTreeSet<Version>,
) -> Vec<MigrationSummary> {
    catalogue
        .iter()
        .filter(|m| is_pending(m.version(), origin, applied))
        .map(MigrationSummary::from)
        .collect()
}
