//! Dump command - write the current schema as a baseline script

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::get_context;
use crate::output;

pub fn run(project_dir: &Path, output_path: Option<PathBuf>) -> Result<()> {
    let ctx = get_context(project_dir)?;
    let path = output_path.unwrap_or_else(|| ctx.config.schema_path.clone());

    let result = ctx.dump_service().dump_to_file(&path)?;

    output::success(&format!(
        "Dumped {} object(s) and {} version(s) to {}",
        result.objects,
        result.versions,
        result.path.display()
    ));

    Ok(())
}
