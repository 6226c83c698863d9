//! `nando import <file.csv>` and `nando import-searchable <file.csv>`.

use crate::cli::output;
use crate::config::Settings;
use crate::registry::RegistryStore;
use crate::tabular;
use anyhow::{Context, Result};
use std::path::Path;

/// Import a taxonomy CSV into the store.
pub async fn run(file: &Path) -> Result<()> {
    let csv = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let settings = Settings::from_env();
    let mut store = RegistryStore::open(&settings.database_path)?;
    let outcome = tabular::import_diseases(&mut store, &csv)?;

    if output::is_json() {
        output::print_json(&serde_json::json!(outcome));
    } else if !output::is_quiet() {
        println!("  Imported:  {}", outcome.imported);
        println!("  Updated:   {}", outcome.updated);
        println!("  Skipped:   {}", outcome.skipped);
        if !outcome.errors.is_empty() {
            println!("  Errors:");
            for e in &outcome.errors {
                println!("    {e}");
            }
        }
    }

    Ok(())
}

/// Re-import a searchable-flag sheet.
pub async fn run_searchable(file: &Path) -> Result<()> {
    let csv = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let settings = Settings::from_env();
    let mut store = RegistryStore::open(&settings.database_path)?;
    let updated = tabular::import_searchable(&mut store, &csv)?;

    if output::is_json() {
        output::print_json(&serde_json::json!({ "updated": updated }));
    } else if !output::is_quiet() {
        println!("  Updated {updated} searchable flags.");
    }

    Ok(())
}
