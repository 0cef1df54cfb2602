//! Migrations packaged in a zip archive
//!
//! The archive uses the same layout as a project directory:
//! `migrations/<version>_<description>.sql` and an optional
//! `schema/baseline.sql`.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use zip::result::ZipError;
use zip::ZipArchive;

use crate::domain::result::{Error, Result};
use crate::domain::{Migration, Script, ScriptLocation};
use crate::ports::MigrationSource;

use super::{BASELINE_PATH, MIGRATIONS_DIR, MIGRATION_EXT};

/// Migration source reading from a zip file
#[derive(Debug, Clone)]
pub struct ArchiveSource {
    path: PathBuf,
}

impl ArchiveSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn open(&self) -> Result<ZipArchive<File>> {
        let file = File::open(&self.path).map_err(|e| Error::enumeration(self.name(), e))?;
        ZipArchive::new(file).map_err(|e| Error::enumeration(self.name(), e))
    }
}

/// Whether `entry` is a `.sql` file directly inside the migrations directory
fn is_migration_entry(entry: &str) -> bool {
    let Some(file) = entry
        .strip_prefix(MIGRATIONS_DIR)
        .and_then(|rest| rest.strip_prefix('/'))
    else {
        return false;
    };
    !file.is_empty() && !file.contains('/') && file.ends_with(&format!(".{}", MIGRATION_EXT))
}

impl MigrationSource for ArchiveSource {
    fn name(&self) -> String {
        format!("archive {}", self.path.display())
    }

    fn list_migrations(&self) -> Result<Vec<Migration>> {
        let archive = self.open()?;
        let entries: Vec<String> = archive
            .file_names()
            .filter(|entry| is_migration_entry(entry))
            .map(str::to_string)
            .collect();

        entries
            .into_iter()
            .map(|entry| {
                Migration::new(
                    &entry,
                    ScriptLocation::ZipEntry {
                        archive: self.path.clone(),
                        entry: entry.clone(),
                    },
                )
            })
            .collect()
    }

    fn baseline_schema(&self) -> Result<Option<Script>> {
        let mut archive = self.open()?;

        let mut entry = match archive.by_name(BASELINE_PATH) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(Error::enumeration(self.name(), e)),
        };

        let mut text = String::new();
        entry.read_to_string(&mut text)?;
        Ok(Some(Script::new(
            format!("{}:{}", self.path.display(), BASELINE_PATH),
            text,
        )))
    }
}
