//! Scaffold service - creates new, empty migration files

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::domain::result::{Error, Result};
use crate::domain::{Migration, ScriptLocation};

/// Service for creating migration files in a directory
pub struct ScaffoldService {
    migrations_dir: PathBuf,
}

impl ScaffoldService {
    pub fn new(migrations_dir: PathBuf) -> Self {
        Self { migrations_dir }
    }

    /// Create `<timestamp>_<snake_name>.sql`, versioned by the current time
    pub fn create(&self, name: &str) -> Result<Migration> {
        self.create_at(name, Utc::now())
    }

    /// Create a migration versioned by `now`, to the millisecond
    /// (e.g. `20240315093000123_add_user_email.sql`)
    pub fn create_at(&self, name: &str, now: DateTime<Utc>) -> Result<Migration> {
        let description = snake_case(name);
        let file_name = format!("{}_{}.sql", now.format("%Y%m%d%H%M%S%3f"), description);
        let path = self.migrations_dir.join(&file_name);

        let migration = Migration::new(&file_name, ScriptLocation::File(path.clone()))
            .map_err(|_| Error::invalid_identifier(name))?;

        fs::create_dir_all(&self.migrations_dir)?;
        // Never clobber an existing migration
        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        writeln!(file, "-- {}", name.trim())?;
        writeln!(file, "-- Separate statements with a blank line.")?;

        tracing::info!(path = %path.display(), version = migration.version(), "created migration");
        Ok(migration)
    }
}

/// `AddUserEmail`, `add user-email` and `add_user_email` all become `add_user_email`
fn snake_case(name: &str) -> String {
    let mut out = String::new();
    let mut after_lower = false;

    for c in name.trim().chars() {
        if c.is_ascii_uppercase() {
            if after_lower {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
            after_lower = false;
        } else if c.is_ascii_alphanumeric() {
            out.push(c);
            after_lower = true;
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            after_lower = false;
        }
    }

    out.trim_end_matches('_').to_string()
}
