//! CLI handler for `nando sweep`: bulk discovery over every searchable
//! disease, with a progress bar fed by sweep events.

use crate::cli::output;
use crate::cli::serve::build_state;
use crate::config::Settings;
use crate::events::DiscoveryEvent;
use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

/// Run discovery for all searchable diseases with a progress bar.
pub async fn run() -> Result<()> {
    let settings = Settings::from_env();
    if !settings.search_configured() {
        bail!("GOOGLE_API_KEY and GOOGLE_CSE_ID must be set for discovery");
    }

    let state = build_state(settings)?;
    // Subscribe before spawning so the first progress event is not missed.
    let mut rx = state.bus.subscribe();
    let pipeline = Arc::clone(&state.pipeline);
    let mut handle = tokio::spawn(async move { pipeline.sweep().await });

    let pb = if output::is_quiet() || output::is_json() {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    };

    let report = loop {
        tokio::select! {
            res = &mut handle => break res??,
            ev = rx.recv() => {
                if let Ok(DiscoveryEvent::SweepProgress { completed, total, current }) = ev {
                    if pb.length() != Some(total as u64) {
                        pb.set_length(total as u64);
                    }
                    pb.set_position(completed as u64);
                    if !current.is_empty() {
                        pb.set_message(current);
                    }
                }
            }
        }
    };
    pb.finish_and_clear();

    if output::is_json() {
        output::print_json(&serde_json::json!(report));
    } else if !output::is_quiet() {
        println!("  Swept {} diseases ({} failed).", report.diseases, report.failed);
        println!("  Stored {} organizations.", report.organizations);
    }

    Ok(())
}
