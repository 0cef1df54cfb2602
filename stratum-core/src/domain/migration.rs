//! Migration domain model

use std::cmp::Ordering;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use duckdb::Connection;
use regex::Regex;
use zip::ZipArchive;

use super::result::{Error, Result};
use super::script::{Script, Statement, StatementKind};

/// Migration version, parsed from the numeric prefix of the identifier
pub type Version = u64;

/// Origin version of a database whose bookkeeping table is empty
pub const NO_VERSIONS: Option<Version> = None;

/// Table recording one row per applied migration
pub const BOOKKEEPING_TABLE: &str = "schema_migrations";

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9]+)_(.+)\.sql$").expect("migration identifier pattern is valid")
    })
}

/// Where the SQL text of a migration lives
#[derive(Debug, Clone)]
pub enum ScriptLocation {
    /// Text held in memory (compiled into the binary or built in tests)
    Inline(Arc<str>),
    /// A file on disk
    File(PathBuf),
    /// An entry inside a zip archive
    ZipEntry { archive: PathBuf, entry: String },
}

impl ScriptLocation {
    /// Read the script text
    pub fn read(&self) -> Result<String> {
        match self {
            ScriptLocation::Inline(text) => Ok(text.to_string()),
            ScriptLocation::File(path) => Ok(std::fs::read_to_string(path)?),
            ScriptLocation::ZipEntry { archive, entry } => {
                let source_name = archive.display().to_string();
                let file = File::open(archive)?;
                let mut zip =
                    ZipArchive::new(file).map_err(|e| Error::enumeration(&source_name, e))?;
                let mut zipped = zip
                    .by_name(entry)
                    .map_err(|e| Error::enumeration(&source_name, format!("{}: {}", entry, e)))?;
                let mut text = String::new();
                zipped.read_to_string(&mut text)?;
                Ok(text)
            }
        }
    }
}

/// A single versioned SQL migration
///
/// Identifiers follow `<version>_<description>.sql`, e.g. `1402070000_Origin.sql`.
/// The script itself is only read when the migration is applied.
#[derive(Debug, Clone)]
pub struct Migration {
    version: Version,
    description: String,
    name: String,
    location: ScriptLocation,
}

impl Migration {
    /// Parse an identifier and attach the location of its script.
    ///
    /// Path-like identifiers are accepted; only the last `/`-separated
    /// component has to match the pattern.
    pub fn new(identifier: &str, location: ScriptLocation) -> Result<Self> {
        let name = identifier.rsplit('/').next().unwrap_or(identifier);

        let captures = identifier_pattern()
            .captures(name)
            .ok_or_else(|| Error::invalid_identifier(identifier))?;

        // The pattern guarantees digits, so this only fails on overflow
        let version: Version = captures[1]
            .parse()
            .map_err(|_| Error::invalid_identifier(identifier))?;

        Ok(Self {
            version,
            description: captures[2].to_string(),
            name: name.to_string(),
            location,
        })
    }

    /// Migration whose script is held in memory
    pub fn inline(identifier: &str, sql: impl Into<Arc<str>>) -> Result<Self> {
        Self::new(identifier, ScriptLocation::Inline(sql.into()))
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// File name of the migration, e.g. `1402070000_Origin.sql`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Load the script of this migration
    pub fn script(&self) -> Result<Script> {
        Ok(Script::new(self.name.clone(), self.location.read()?))
    }

    /// Execute every statement of the migration.
    ///
    /// Must be called inside the caller's transaction; this never begins,
    /// commits or rolls back on its own, and records nothing. The whole script
    /// is parsed before the first statement runs.
    pub fn execute(&self, conn: &Connection) -> Result<()> {
        let statements = self.script()?.parse()?;

        for statement in &statements {
            execute_statement(conn, statement).map_err(|source| Error::MigrationApply {
                version: self.version,
                statement: statement.sql.clone(),
                source,
            })?;
        }

        Ok(())
    }
}

/// Run a single parsed statement
///
/// The parser only yields blocks holding one command, so a stray `COMMIT;`
/// never reaches the database and cannot end the caller's transaction.
pub(crate) fn execute_statement(conn: &Connection, statement: &Statement) -> duckdb::Result<()> {
    match statement.kind {
        StatementKind::Exec => conn.execute_batch(&statement.sql),
        StatementKind::Query => {
            let mut stmt = conn.prepare(&statement.sql)?;
            let mut rows = stmt.query([])?;
            while rows.next()?.is_some() {}
            Ok(())
        }
    }
}

impl PartialEq for Migration {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
    }
}

impl Eq for Migration {}

impl PartialOrd for Migration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Migration {
    fn cmp(&self, other: &Self) -> Ordering {
        self.version.cmp(&other.version)
    }
}

/// Version-sorted set of migrations with unique versions
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    migrations: Vec<Migration>,
}

impl Catalogue {
    /// Sort the migrations and reject duplicate versions.
    ///
    /// `source_name` is only used in the error message.
    pub fn new(mut migrations: Vec<Migration>, source_name: &str) -> Result<Self> {
        migrations.sort();

        if let Some(pair) = migrations.windows(2).find(|w| w[0].version == w[1].version) {
            return Err(Error::enumeration(
                source_name,
                format!(
                    "duplicate migration version {} ({} and {})",
                    pair[0].version, pair[0].name, pair[1].name
                ),
            ));
        }

        Ok(Self { migrations })
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Migration> {
        self.migrations.iter()
    }

    /// Highest version in the catalogue
    pub fn latest_version(&self) -> Option<Version> {
        self.migrations.last().map(|m| m.version)
    }

    pub fn get(&self, version: Version) -> Option<&Migration> {
        self.migrations
            .binary_search_by_key(&version, |m| m.version)
            .ok()
            .map(|idx| &self.migrations[idx])
    }

    pub fn versions(&self) -> Vec<Version> {
        self.migrations.iter().map(|m| m.version).collect()
    }
}

impl<'a> IntoIterator for &'a Catalogue {
    type Item = &'a Migration;
    type IntoIter = std::slice::Iter<'a, Migration>;

    fn into_iter(self) -> Self::IntoIter {
        self.migrations.iter()
    }
}

impl IntoIterator for Catalogue {
    type Item = Migration;
    type IntoIter = std::vec::IntoIter<Migration>;

    fn into_iter(self) -> Self::IntoIter {
        self.migrations.into_iter()
    }
}
