//! Migrations read from a directory on disk

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::result::{Error, Result};
use crate::domain::{Migration, Script, ScriptLocation};
use crate::ports::MigrationSource;

use super::{BASELINE_PATH, MIGRATIONS_DIR, MIGRATION_EXT};

/// Migration source reading `*.sql` files from a directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    migrations_dir: PathBuf,
    baseline_path: Option<PathBuf>,
}

impl DirectorySource {
    /// Source over an explicit migrations directory, with no baseline
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            baseline_path: None,
        }
    }

    /// Source over a project laid out as `migrations/` plus `schema/baseline.sql`
    pub fn from_project(root: &Path) -> Self {
        Self::new(root.join(MIGRATIONS_DIR)).with_baseline(root.join(BASELINE_PATH))
    }

    /// Baseline script to run when bootstrapping; ignored if the file does not exist
    pub fn with_baseline(mut self, path: impl Into<PathBuf>) -> Self {
        self.baseline_path = Some(path.into());
        self
    }
}

impl MigrationSource for DirectorySource {
    fn name(&self) -> String {
        format!("directory {}", self.migrations_dir.display())
    }

    fn list_migrations(&self) -> Result<Vec<Migration>> {
        let entries =
            fs::read_dir(&self.migrations_dir).map_err(|e| Error::enumeration(self.name(), e))?;

        let mut migrations = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| Error::enumeration(self.name(), e))?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(MIGRATION_EXT) {
                continue;
            }

            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| Error::invalid_identifier(path.display().to_string()))?
                .to_string();
            migrations.push(Migration::new(&file_name, ScriptLocation::File(path))?);
        }

        Ok(migrations)
    }

    fn baseline_schema(&self) -> Result<Option<Script>> {
        let Some(path) = &self.baseline_path else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(path).map_err(|e| Error::enumeration(self.name(), e))?;
        Ok(Some(Script::new(path.display().to_string(), text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("migrations")).unwrap();
        fs::create_dir_all(dir.path().join("schema")).unwrap();
        dir
    }

    #[test]
    fn test_lists_sql_files_only() {
        let dir = project();
        let migrations = dir.path().join("migrations");
        fs::write(migrations.join("1000_a.sql"), "CREATE TABLE a (x INTEGER);").unwrap();
        fs::write(migrations.join("2000_b.sql"), "CREATE TABLE b (x INTEGER);").unwrap();
        fs::write(migrations.join("README.md"), "notes").unwrap();
        fs::create_dir(migrations.join("3000_dir.sql")).unwrap();

        let source = DirectorySource::from_project(dir.path());
        let mut versions: Vec<u64> = source
            .list_migrations()
            .unwrap()
            .iter()
            .map(|m| m.version())
            .collect();
        versions.sort();
        assert_eq!(versions, vec![1000, 2000]);
    }

    #[test]
    fn test_migration_reads_its_file() {
        let dir = project();
        fs::write(
            dir.path().join("migrations/1000_a.sql"),
            "CREATE TABLE a (x INTEGER);",
        )
        .unwrap();

        let source = DirectorySource::from_project(dir.path());
        let migrations = source.list_migrations().unwrap();
        let script = migrations[0].script().unwrap();
        assert_eq!(script.text(), "CREATE TABLE a (x INTEGER);");
    }

    #[test]
    fn test_invalid_file_name_fails() {
        let dir = project();
        fs::write(dir.path().join("migrations/bad.sql"), "").unwrap();

        let source = DirectorySource::from_project(dir.path());
        assert!(matches!(
            source.list_migrations(),
            Err(Error::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_missing_directory_is_enumeration_error() {
        let dir = TempDir::new().unwrap();
        let source = DirectorySource::new(dir.path().join("nope"));
        assert!(matches!(
            source.list_migrations(),
            Err(Error::Enumeration { .. })
        ));
    }

    #[test]
    fn test_baseline_optional() {
        let dir = project();
        let source = DirectorySource::from_project(dir.path());
        assert!(source.baseline_schema().unwrap().is_none());

        fs::write(
            dir.path().join("schema/baseline.sql"),
            "CREATE TABLE base (x INTEGER);",
        )
        .unwrap();
        let baseline = source.baseline_schema().unwrap().unwrap();
        assert_eq!(baseline.text(), "CREATE TABLE base (x INTEGER);");
    }

    #[test]
    fn test_unreadable_baseline_names_source() {
        let dir = project();
        // Exists, but cannot be read as a file
        let source = DirectorySource::new(dir.path().join("migrations"))
            .with_baseline(dir.path().join("schema"));

        match source.baseline_schema() {
            Err(Error::Enumeration { source_name, .. }) => {
                assert_eq!(source_name, source.name());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
