//! Bootstrap command - create the bookkeeping table without migrating

use std::path::Path;

use anyhow::Result;

use super::get_context;
use crate::output;

pub fn run(project_dir: &Path) -> Result<()> {
    let ctx = get_context(project_dir)?;

    if ctx.bootstrap()? {
        output::success(&format!("Bootstrapped {}", ctx.config.database.display()));
    } else {
        output::warning("Database is already bootstrapped");
    }

    Ok(())
}
