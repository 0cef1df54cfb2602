//! Migrations compiled into the binary
//!
//! Applications embed their scripts with `include_str!`:
//!
//! ```ignore
//! const MIGRATIONS: &[(&str, &str)] = &[
//!     ("1402070000_Origin.sql", include_str!("migrations/1402070000_Origin.sql")),
//!     ("1402080000_AddEmail.sql", include_str!("migrations/1402080000_AddEmail.sql")),
//! ];
//!
//! let source = EmbeddedSource::new("app", MIGRATIONS)
//!     .with_baseline(include_str!("schema/baseline.sql"));
//! ```

use std::sync::Arc;

use crate::domain::result::Result;
use crate::domain::{Migration, Script, ScriptLocation};
use crate::ports::MigrationSource;

/// Migration source backed by static `(filename, sql)` pairs
#[derive(Debug, Clone)]
pub struct EmbeddedSource {
    name: String,
    migrations: Vec<(String, Arc<str>)>,
    baseline: Option<Arc<str>>,
}

impl EmbeddedSource {
    pub fn new(name: impl Into<String>, migrations: &[(&str, &str)]) -> Self {
        Self {
            name: name.into(),
            migrations: migrations
                .iter()
                .map(|(file, sql)| (file.to_string(), Arc::from(*sql)))
                .collect(),
            baseline: None,
        }
    }

    /// Set the baseline schema used when bootstrapping a fresh database
    pub fn with_baseline(mut self, sql: impl Into<Arc<str>>) -> Self {
        self.baseline = Some(sql.into());
        self
    }

    /// Add one more migration
    pub fn with_migration(mut self, file: impl Into<String>, sql: impl Into<Arc<str>>) -> Self {
        self.migrations.push((file.into(), sql.into()));
        self
    }
}

impl MigrationSource for EmbeddedSource {
    fn name(&self) -> String {
        format!("embedded {}", self.name)
    }

    fn list_migrations(&self) -> Result<Vec<Migration>> {
        self.migrations
            .iter()
            .map(|(file, sql)| Migration::new(file, ScriptLocation::Inline(Arc::clone(sql))))
            .collect()
    }

    fn baseline_schema(&self) -> Result<Option<Script>> {
        Ok(self
            .baseline
            .as_ref()
            .map(|sql| Script::new(format!("{} baseline", self.name), sql.to_string())))
    }
}
