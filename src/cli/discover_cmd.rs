//! CLI handler for `nando discover <disease-id>`: one discovery run.

use crate::cli::output;
use crate::cli::serve::build_state;
use crate::config::Settings;
use anyhow::{bail, Result};
use uuid::Uuid;

/// Run organization discovery for a single disease and print the results.
pub async fn run(disease_id: i64) -> Result<()> {
    let settings = Settings::from_env();
    if !settings.search_configured() {
        bail!("GOOGLE_API_KEY and GOOGLE_CSE_ID must be set for discovery");
    }

    let state = build_state(settings)?;
    let report = state.pipeline.run(Uuid::new_v4(), disease_id).await?;

    if output::is_json() {
        output::print_json(&serde_json::json!(report));
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    if report.organizations.is_empty() {
        println!("  No organizations found for disease {disease_id}.");
        return Ok(());
    }
    println!(
        "  Found {} organizations in {:.1}s:\n",
        report.organizations.len(),
        report.elapsed_ms as f64 / 1000.0
    );
    for org in &report.organizations {
        println!("    {:<40}  [{}]", org.name, org.category.as_str());
        if let Some(url) = &org.url {
            println!("      {url}");
        }
        if let Some(desc) = &org.description {
            println!("      {desc}");
        }
    }

    Ok(())
}
