//! Environment readiness check.

use crate::config::Settings;
use crate::llm::{LlmClient, OpenAiCompatClient};
use anyhow::Result;
use std::time::Duration;

/// Probe timeout. Doctor should answer fast even with the provider down.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Check database path, search credentials, and LLM reachability.
pub async fn run() -> Result<()> {
    let settings = Settings::from_env();

    println!("NANDO Doctor");
    println!("============");
    println!();

    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    println!("OS:   {os}");
    println!("Arch: {arch}");
    println!();

    // Database path
    let db = &settings.database_path;
    let db_ok = if db.exists() {
        println!("[OK] Database found: {}", db.display());
        true
    } else {
        let parent_writable = db
            .parent()
            .map(|p| std::fs::create_dir_all(p).is_ok())
            .unwrap_or(false);
        if parent_writable {
            println!("[OK] Database will be created at {}", db.display());
            true
        } else {
            println!("[!!] Database path is not writable: {}", db.display());
            false
        }
    };

    // Search credentials
    let search_ok = settings.search_configured();
    if search_ok {
        println!("[OK] Google Custom Search credentials present");
    } else {
        println!("[!!] GOOGLE_API_KEY / GOOGLE_CSE_ID not set. Discovery will refuse to start.");
    }

    // LLM provider
    let llm = OpenAiCompatClient::new(&settings.llm_base_url, &settings.llm_model, PROBE_TIMEOUT);
    let llm_ok = llm.health().await;
    if llm_ok {
        let models = llm.models().await;
        if models.iter().any(|m| m == &settings.llm_model) {
            println!(
                "[OK] LLM reachable at {} (model {} loaded)",
                settings.llm_base_url, settings.llm_model
            );
        } else {
            println!(
                "[OK] LLM reachable at {} ({} models, {} not among them)",
                settings.llm_base_url,
                models.len(),
                settings.llm_model
            );
        }
    } else {
        println!(
            "[!!] LLM NOT reachable at {}. Start your local server or set LLM_BASE_URL.",
            settings.llm_base_url
        );
    }

    println!();
    println!("Classifier mode: {}", settings.classifier_mode.as_str());
    println!();

    let ready = db_ok && search_ok && llm_ok;
    if ready {
        println!("Status: READY");
    } else {
        println!("Status: NOT READY");
        println!("  Fix the [!!] items above to enable discovery.");
    }

    Ok(())
}
