//! Migrate command - apply pending migrations

use std::path::Path;

use anyhow::Result;

use super::get_context;
use crate::output::{self, format_version};

pub fn run(project_dir: &Path, target: Option<u64>, json: bool) -> Result<()> {
    let ctx = get_context(project_dir)?;
    let result = ctx.migrate_to(target)?;

    if json {
        return output::json(&result);
    }

    if result.bootstrapped {
        output::info(&format!(
            "Bootstrapped database (origin version {})",
            format_version(result.origin_version)
        ));
    }

    if result.applied.is_empty() {
        output::success("No pending migrations");
        return Ok(());
    }

    for migration in &result.applied {
        println!("  {} {}", migration.version, migration.description);
    }
    output::success(&format!("Applied {} migration(s)", result.applied_count()));

    Ok(())
}
