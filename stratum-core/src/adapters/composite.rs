//! Several migration sources merged into one

use crate::domain::result::Result;
use crate::domain::{Migration, Script};
use crate::ports::MigrationSource;

/// Ordered list of sources behaving as a single source.
///
/// Migrations from every source are merged; the catalogue built from them
/// rejects a version that appears in more than one source. The baseline is
/// taken from the first source that has one.
#[derive(Default)]
pub struct CompositeSource {
    sources: Vec<Box<dyn MigrationSource>>,
}

impl CompositeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: impl MigrationSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn push(&mut self, source: Box<dyn MigrationSource>) {
        self.sources.push(source);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl MigrationSource for CompositeSource {
    fn name(&self) -> String {
        let names: Vec<String> = self.sources.iter().map(|s| s.name()).collect();
        format!("[{}]", names.join(", "))
    }

    fn list_migrations(&self) -> Result<Vec<Migration>> {
        let mut migrations = Vec::new();
        for source in &self.sources {
            migrations.extend(source.list_migrations()?);
        }
        Ok(migrations)
    }

    fn baseline_schema(&self) -> Result<Option<Script>> {
        for source in &self.sources {
            if let Some(script) = source.baseline_schema()? {
                return Ok(Some(script));
            }
        }
        Ok(None)
    }
}
