//! List command - show the catalogue with applied and pending markers

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, Color};
use serde::Serialize;
use stratum_core::MigrationSource;

use super::get_context;
use crate::output;

#[derive(Serialize)]
struct ListEntry {
    version: u64,
    description: String,
    name: String,
    state: &'static str,
}

pub fn run(project_dir: &Path, json: bool) -> Result<()> {
    let ctx = get_context(project_dir)?;
    let catalogue = ctx.catalogue()?;
    let status = ctx.status()?;

    // Anything not pending was either applied or skipped as at or below the origin
    let entries: Vec<ListEntry> = catalogue
        .iter()
        .map(|m| {
            let pending = status.pending.iter().any(|p| p.version == m.version());
            let state = if pending {
                "pending"
            } else if status.origin_version.is_some_and(|o| m.version() < o) {
                "skipped"
            } else {
                "applied"
            };
            ListEntry {
                version: m.version(),
                description: m.description().to_string(),
                name: m.name().to_string(),
                state,
            }
        })
        .collect();

    if json {
        return output::json(&entries);
    }

    if entries.is_empty() {
        output::warning("No migrations found");
        return Ok(());
    }

    println!("{}", ctx.source.name().bold());
    println!();

    let mut table = output::create_table();
    table.set_header(vec!["Version", "Description", "State"]);
    for entry in &entries {
        let state = match entry.state {
            "pending" => Cell::new("PENDING").fg(Color::Yellow),
            "skipped" => Cell::new("SKIPPED").fg(Color::DarkGrey),
            _ => Cell::new("APPLIED").fg(Color::Green),
        };
        table.add_row(vec![
            Cell::new(entry.version),
            Cell::new(&entry.description),
            state,
        ]);
    }
    println!("{}", table);

    Ok(())
}
