//! Dump service - writes the current schema as a baseline script
//!
//! The dump is itself a valid baseline: every object is one statement,
//! statements are separated by blank lines, and the applied versions are
//! replayed as inserts into the bookkeeping table. Bootstrapping a fresh
//! database from it yields the same schema and the same origin version.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use duckdb::Connection;
use serde::Serialize;

use crate::domain::result::Result;
use crate::domain::BOOKKEEPING_TABLE;
use crate::services::SchemaState;

/// Catalog queries, in the order objects have to be recreated
const OBJECT_QUERIES: &[(&str, &str)] = &[
    (
        "sequence",
        "SELECT sequence_name, sql FROM duckdb_sequences()
         WHERE database_name = current_database() AND schema_name = current_schema()
         ORDER BY sequence_oid",
    ),
    (
        "table",
        "SELECT table_name, sql FROM duckdb_tables()
         WHERE NOT internal AND database_name = current_database() AND schema_name = current_schema()
         ORDER BY table_oid",
    ),
    (
        "view",
        "SELECT view_name, sql FROM duckdb_views()
         WHERE NOT internal AND database_name = current_database() AND schema_name = current_schema()
         ORDER BY view_oid",
    ),
    (
        "index",
        "SELECT index_name, sql FROM duckdb_indexes()
         WHERE sql IS NOT NULL AND database_name = current_database() AND schema_name = current_schema()
         ORDER BY index_oid",
    ),
];

/// Result of a dump written to disk
#[derive(Debug, Serialize)]
pub struct DumpResult {
    pub path: PathBuf,
    pub objects: usize,
    pub versions: usize,
}

/// A dumped schema
#[derive(Debug, Clone)]
pub struct SchemaDump {
    pub sql: String,
    pub objects: usize,
    pub versions: usize,
}

/// Service for dumping a database schema
pub struct DumpService<'a> {
    conn: &'a Connection,
}

impl<'a> DumpService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Render the schema and applied versions as a baseline script
    pub fn dump(&self) -> Result<SchemaDump> {
        let mut statements = Vec::new();

        for (kind, query) in OBJECT_QUERIES {
            let mut stmt = self.conn.prepare(query)?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
            })?;
            for row in rows {
                let (name, sql) = row?;
                let Some(sql) = sql else {
                    continue;
                };
                tracing::debug!(kind = *kind, name = %name, "dumping object");
                statements.push(normalize(&sql));
            }
        }
        let objects = statements.len();

        let state = SchemaState::new(self.conn);
        let versions = if state.is_bootstrapped()? {
            state.applied_versions()?
        } else {
            Default::default()
        };
        for version in &versions {
            statements.push(format!(
                "INSERT INTO {} (version) VALUES ({});",
                BOOKKEEPING_TABLE, version
            ));
        }

        let mut sql = format!(
            "-- Baseline schema dumped {}\n",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        for statement in &statements {
            sql.push('\n');
            sql.push_str(statement);
            sql.push('\n');
        }

        Ok(SchemaDump {
            sql,
            objects,
            versions: versions.len(),
        })
    }

    /// Dump to `path`, creating parent directories as needed
    pub fn dump_to_file(&self, path: &Path) -> Result<DumpResult> {
        let dump = self.dump()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &dump.sql)?;

        tracing::info!(path = %path.display(), objects = dump.objects, "wrote schema dump");
        Ok(DumpResult {
            path: path.to_path_buf(),
            objects: dump.objects,
            versions: dump.versions,
        })
    }
}

/// One statement per object: no blank lines inside, terminated by `;`
fn normalize(sql: &str) -> String {
    let lines: Vec<&str> = sql.lines().filter(|l| !l.trim().is_empty()).collect();
    let mut statement = lines.join("\n").trim().to_string();
    if !statement.ends_with(';') {
        statement.push(';');
    }
    statement
}
