//! Show taxonomy counters: totals, searchable set, reduction rate.

use crate::cli::output;
use crate::config::Settings;
use crate::registry::RegistryStore;
use crate::taxonomy::{self, HierarchyClassifier};
use anyhow::Result;

/// Print hierarchy statistics under the configured classifier mode.
pub async fn run() -> Result<()> {
    let settings = Settings::from_env();
    let store = RegistryStore::open(&settings.database_path)?;
    let classifier = HierarchyClassifier::default();
    let stats = taxonomy::hierarchy_stats(&store, settings.classifier_mode, &classifier)?;

    if output::is_json() {
        output::print_json(&serde_json::json!(stats));
        return Ok(());
    }

    println!("  Taxonomy stats ({} mode):", settings.classifier_mode.as_str());
    println!("    Diseases:           {}", stats.total_diseases);
    println!("    Searchable:         {}", stats.searchable_diseases);
    println!("    Reduction:          {}", stats.reduction_rate);
    println!("    Subtypes:           {}", stats.subtype_count);
    println!("    Subtype patterns:   {}", stats.subtype_pattern_count);
    println!("    Excluded categories: {}", stats.excluded_categories.len());

    Ok(())
}
