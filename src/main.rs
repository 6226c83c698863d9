// Copyright 2026 NANDO Registry Contributors
// SPDX-License-Identifier: Apache-2.0

#![allow(dead_code, unused_imports)]

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

mod cli;
mod config;
mod discovery;
mod error;
mod events;
mod llm;
mod registry;
mod rest;
mod tabular;
mod taxonomy;

#[derive(Parser)]
#[command(
    name = "nando",
    about = "NANDO registry — disease taxonomy curation and patient-support organization discovery",
    version,
    after_help = "Run 'nando <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable verbose/debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the registry HTTP server
    Serve {
        /// Port to listen on (overrides NANDO_HTTP_PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Import a taxonomy CSV (NANDO + label columns)
    Import {
        /// CSV file to import
        file: PathBuf,
    },
    /// Export the searchable-flag sheet as CSV
    Export {
        /// Output file (stdout when omitted)
        file: Option<PathBuf>,
    },
    /// Re-import curated searchable flags from a CSV
    ImportSearchable {
        /// CSV file with NANDO/label and is_searchable columns
        file: PathBuf,
    },
    /// Run organization discovery for one disease
    Discover {
        /// Disease id (primary key)
        disease_id: i64,
    },
    /// Run discovery over every searchable disease
    Sweep,
    /// Show taxonomy statistics
    Stats,
    /// Check environment and diagnose issues
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global flags via environment variables so all modules can check them
    if cli.json {
        std::env::set_var("NANDO_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("NANDO_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("NANDO_VERBOSE", "1");
    }
    if cli.no_color {
        std::env::set_var("NANDO_NO_COLOR", "1");
    }

    let result = match cli.command {
        Commands::Serve { port } => cli::serve::run(port).await,
        Commands::Import { file } => cli::import_cmd::run(&file).await,
        Commands::Export { file } => cli::export_cmd::run(file.as_deref()).await,
        Commands::ImportSearchable { file } => cli::import_cmd::run_searchable(&file).await,
        Commands::Discover { disease_id } => cli::discover_cmd::run(disease_id).await,
        Commands::Sweep => cli::sweep_cmd::run().await,
        Commands::Stats => cli::stats::run().await,
        Commands::Doctor => cli::doctor::run().await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "nando", &mut std::io::stdout());
            Ok(())
        }
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if !cli::output::is_quiet() && !cli::output::is_json() {
            eprintln!("  Error: {e:#}");
        }
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        }
        std::process::exit(1);
    }

    result
}
