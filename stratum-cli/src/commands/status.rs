//! Status command - show where the database stands

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use super::get_context;
use crate::output::{self, format_version};

pub fn run(project_dir: &Path, json: bool) -> Result<()> {
    let ctx = get_context(project_dir)?;
    let status = ctx.status()?;

    if json {
        return output::json(&status);
    }

    println!("{}", "Migration Status".bold());
    println!();

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec!["Database", &ctx.config.database.display().to_string()]);
    table.add_row(vec![
        "Bootstrapped",
        if status.bootstrapped { "yes" } else { "no" },
    ]);
    table.add_row(vec!["Origin version", &format_version(status.origin_version)]);
    table.add_row(vec!["Current version", &format_version(status.current_version)]);
    table.add_row(vec!["Latest version", &format_version(status.latest_version)]);
    table.add_row(vec!["Applied", &status.applied_count.to_string()]);
    table.add_row(vec!["Pending", &status.pending.len().to_string()]);

    println!("{}", table);
    println!();

    if status.is_up_to_date() {
        output::success("Database is up to date");
        return Ok(());
    }

    println!("{}", "Pending Migrations".bold());
    for migration in &status.pending {
        println!("  • {}", migration.name);
    }

    Ok(())
}
