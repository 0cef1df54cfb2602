//! Schema state - the bookkeeping table of applied versions
//!
//! Every applied migration leaves one row in `schema_migrations`. A database
//! created from a baseline schema carries the rows of the migrations that
//! baseline already contains, and the lowest of them is its origin version.

use std::collections::BTreeSet;

use duckdb::{params, Connection};

use crate::domain::migration::execute_statement;
use crate::domain::result::{Error, Result};
use crate::domain::{Migration, Script, Version, BOOKKEEPING_TABLE};

/// Accessor for the bookkeeping table on one connection
pub struct SchemaState<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaState<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Check if the bookkeeping table exists
    pub fn is_bootstrapped(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables
             WHERE table_catalog = current_database()
               AND table_schema = current_schema()
               AND table_name = ?",
            [BOOKKEEPING_TABLE],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn require_bootstrapped(&self) -> Result<()> {
        if self.is_bootstrapped()? {
            Ok(())
        } else {
            Err(Error::SchemaNotBootstrapped {
                table: BOOKKEEPING_TABLE.to_string(),
            })
        }
    }

    /// Lowest recorded version, or `NO_VERSIONS` for an empty table.
    ///
    /// Every migration at or below the origin is assumed to be part of the
    /// schema the database was bootstrapped with.
    pub fn origin_version(&self) -> Result<Option<Version>> {
        self.require_bootstrapped()?;
        let version = self.conn.query_row(
            &format!("SELECT CAST(MIN(version) AS UBIGINT) FROM {}", BOOKKEEPING_TABLE),
            [],
            |row| row.get::<_, Option<Version>>(0),
        )?;
        Ok(version)
    }

    /// Highest recorded version, or `None` for an empty table
    pub fn current_version(&self) -> Result<Option<Version>> {
        self.require_bootstrapped()?;
        let version = self.conn.query_row(
            &format!("SELECT CAST(MAX(version) AS UBIGINT) FROM {}", BOOKKEEPING_TABLE),
            [],
            |row| row.get::<_, Option<Version>>(0),
        )?;
        Ok(version)
    }

    /// Every recorded version
    pub fn applied_versions(&self) -> Result<BTreeSet<Version>> {
        self.require_bootstrapped()?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT CAST(version AS UBIGINT) FROM {} ORDER BY version",
            BOOKKEEPING_TABLE
        ))?;
        let versions = stmt.query_map([], |row| row.get::<_, Version>(0))?;

        let mut result = BTreeSet::new();
        for version in versions {
            result.insert(version?);
        }
        Ok(result)
    }

    /// Record a version as applied
    pub fn record_version(&self, version: Version) -> Result<()> {
        self.insert_version(version)?;
        Ok(())
    }

    fn insert_version(&self, version: Version) -> duckdb::Result<usize> {
        self.conn.execute(&insert_version_sql(), params![version])
    }

    /// Run a migration and record its version, on the caller's transaction
    pub fn apply(&self, migration: &Migration) -> Result<()> {
        migration.execute(self.conn)?;

        self.insert_version(migration.version())
            .map_err(|source| Error::MigrationApply {
                version: migration.version(),
                statement: insert_version_sql(),
                source,
            })?;
        Ok(())
    }

    /// Create the bookkeeping table, running `baseline` first if given.
    ///
    /// Does nothing on a database that already has the table, so the baseline
    /// never runs twice. Returns whether anything was created. Runs on the
    /// caller's transaction, if any.
    pub fn bootstrap(&self, baseline: Option<&Script>) -> Result<bool> {
        if self.is_bootstrapped()? {
            tracing::debug!(table = BOOKKEEPING_TABLE, "already bootstrapped");
            return Ok(false);
        }

        if let Some(script) = baseline {
            let statements = script.parse()?;
            tracing::info!(
                baseline = script.name(),
                statements = statements.len(),
                "loading baseline schema"
            );
            for statement in &statements {
                execute_statement(self.conn, statement).map_err(|source| {
                    Error::BaselineApply {
                        script: script.name().to_string(),
                        statement: statement.sql.clone(),
                        source,
                    }
                })?;
            }
        }

        // The baseline may already have created it
        self.conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (version UBIGINT NOT NULL)",
            BOOKKEEPING_TABLE
        ))?;

        tracing::info!(table = BOOKKEEPING_TABLE, "bootstrapped schema");
        Ok(true)
    }
}

fn insert_version_sql() -> String {
    format!("INSERT INTO {} (version) VALUES (?)", BOOKKEEPING_TABLE)
}
