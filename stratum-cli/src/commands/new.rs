//! New command - scaffold an empty migration file

use std::path::Path;

use anyhow::Result;
use stratum_core::services::ScaffoldService;

use super::get_config;
use crate::output;

pub fn run(project_dir: &Path, name: &str) -> Result<()> {
    let config = get_config(project_dir)?;
    let migration = ScaffoldService::new(config.migrations_dir.clone()).create(name)?;

    output::success(&format!(
        "Created {}",
        config.migrations_dir.join(migration.name()).display()
    ));

    Ok(())
}
