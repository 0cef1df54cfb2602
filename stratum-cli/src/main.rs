//! Stratum CLI - versioned schema migrations for DuckDB

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod output;

use commands::{bootstrap, dump, list, migrate, new, status, validate};

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "STRATUM_LOG";

/// Stratum - versioned schema migrations for DuckDB
#[derive(Parser)]
#[command(name = "strat", version, about, long_about = None)]
struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(long, short = 'C', global = true, env = "STRATUM_DIR")]
    dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show where the database stands and what is pending
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply pending migrations
    Migrate {
        /// Stop after this version (applies everything if not specified)
        version: Option<u64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create the bookkeeping table and load the baseline schema
    Bootstrap,

    /// Check that every script parses and the migrations replay cleanly
    Validate {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the current schema as a baseline script
    Dump {
        /// Output file (defaults to the configured schema path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a new, empty migration
    New {
        /// Migration name, e.g. AddUserEmail
        name: String,
    },

    /// List known migrations with their state
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let project_dir = commands::project_dir(cli.dir)?;

    match cli.command {
        Commands::Status { json } => status::run(&project_dir, json),
        Commands::Migrate { version, json } => migrate::run(&project_dir, version, json),
        Commands::Bootstrap => bootstrap::run(&project_dir),
        Commands::Validate { json } => validate::run(&project_dir, json),
        Commands::Dump { output } => dump::run(&project_dir, output),
        Commands::New { name } => new::run(&project_dir, &name),
        Commands::List { json } => list::run(&project_dir, json),
    }
}
