//! Validate command - check scripts without touching the project database

use std::path::Path;

use anyhow::Result;
use stratum_core::services::MigrationService;
use stratum_core::StratumContext;

use super::get_config;
use crate::output;

pub fn run(project_dir: &Path, json: bool) -> Result<()> {
    // Validation replays into scratch databases, so the project database is never opened
    let config = get_config(project_dir)?;
    let source = StratumContext::source_for(&config);
    let report = MigrationService::validate(&source)?;

    if json {
        return output::json(&report);
    }

    match report.baseline_statements {
        Some(count) => output::info(&format!("Baseline schema loads ({} statement(s))", count)),
        None => output::info("No baseline schema"),
    }
    output::success(&format!(
        "{} migration(s) with {} statement(s) replay cleanly",
        report.migrations, report.statements
    ));

    Ok(())
}
