//! CLI handler for `nando export [file.csv]`: write the searchable-flag
//! sheet to a file or stdout.

use crate::cli::output;
use crate::config::Settings;
use crate::registry::RegistryStore;
use crate::tabular;
use anyhow::{Context, Result};
use std::path::Path;

/// Export the taxonomy to a CSV file, or stdout when no path is given.
pub async fn run(file: Option<&Path>) -> Result<()> {
    let settings = Settings::from_env();
    let store = RegistryStore::open(&settings.database_path)?;
    let csv = tabular::export_searchable(&store)?;

    match file {
        Some(path) => {
            std::fs::write(path, &csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            if !output::is_quiet() {
                let rows = csv.lines().count().saturating_sub(1);
                println!("  Wrote {} diseases to {}", rows, path.display());
            }
        }
        None => print!("{csv}"),
    }

    Ok(())
}
