//! Discovery pipeline: terms → search → fetch → extract → dedup → persist.
//!
//! One run covers one disease. Results are accumulated in a run-scoped
//! batch and written in a single transaction at the end, so an aborted run
//! leaves nothing behind. Single-result failures (fetch, extraction) skip
//! that result only. Run state is tracked in an in-process table for the
//! REST status endpoints.

use crate::config::Settings;
use crate::discovery::dedup;
use crate::discovery::extractor::{self, Candidate};
use crate::discovery::fetcher::PageFetcher;
use crate::discovery::terms::generate_terms;
use crate::discovery::websearch::{SearchResult, WebSearch};
use crate::error::{RegistryError, Result};
use crate::events::{DiscoveryEvent, EventBus};
use crate::llm::LlmClient;
use crate::registry::models::{Disease, NewOrganization, Organization};
use crate::registry::store::RegistryStore;
use crate::taxonomy::{self, ClassifierMode, HierarchyClassifier};
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Lifecycle of one discovery run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Completed,
    Failed,
}

/// Status table entry, served by the REST run endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct RunStatus {
    pub run_id: String,
    pub disease_id: i64,
    pub disease_name: String,
    pub state: RunState,
    pub organizations: usize,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub error: Option<String>,
}

/// Outcome of a finished run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub disease_id: i64,
    pub organizations: Vec<Organization>,
    pub elapsed_ms: u64,
}

/// Outcome of a sweep over the searchable set.
#[derive(Debug, Serialize)]
pub struct SweepReport {
    pub diseases: usize,
    pub failed: usize,
    pub organizations: usize,
}

pub struct DiscoveryPipeline {
    store: Arc<Mutex<RegistryStore>>,
    search: Arc<dyn WebSearch>,
    llm: Arc<dyn LlmClient>,
    classifier: Arc<HierarchyClassifier>,
    bus: Arc<EventBus>,
    fetcher: PageFetcher,
    runs: DashMap<Uuid, RunStatus>,
    mode: ClassifierMode,
    max_terms: usize,
    max_results_per_term: usize,
    result_delay: Duration,
}

impl DiscoveryPipeline {
    pub fn new(
        store: Arc<Mutex<RegistryStore>>,
        search: Arc<dyn WebSearch>,
        llm: Arc<dyn LlmClient>,
        classifier: Arc<HierarchyClassifier>,
        bus: Arc<EventBus>,
        settings: &Settings,
    ) -> Self {
        Self {
            store,
            search,
            llm,
            classifier,
            bus,
            fetcher: PageFetcher::new(Duration::from_secs(settings.fetch_timeout_secs)),
            runs: DashMap::new(),
            mode: settings.classifier_mode,
            max_terms: settings.max_terms,
            max_results_per_term: settings.max_results_per_term,
            result_delay: Duration::from_millis(settings.result_delay_ms),
        }
    }

    /// Status of one run, if the run id is known to this process.
    pub fn run_status(&self, run_id: &Uuid) -> Option<RunStatus> {
        self.runs.get(run_id).map(|s| s.clone())
    }

    /// All runs this process has seen, newest first.
    pub fn all_runs(&self) -> Vec<RunStatus> {
        let mut runs: Vec<RunStatus> = self.runs.iter().map(|e| e.value().clone()).collect();
        runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        runs
    }

    /// Run discovery for one disease under a caller-chosen run id.
    pub async fn run(&self, run_id: Uuid, disease_id: i64) -> Result<RunReport> {
        let started = Instant::now();
        let disease = {
            let store = self.store.lock().await;
            store.get_disease(disease_id)?
        }
        .ok_or_else(|| RegistryError::not_found("disease", disease_id))?;

        let rid = run_id.to_string();
        info!(run_id = %rid, disease = %disease.name, "discovery run started");
        self.runs.insert(
            run_id,
            RunStatus {
                run_id: rid.clone(),
                disease_id,
                disease_name: disease.name.clone(),
                state: RunState::Running,
                organizations: 0,
                started_at: Utc::now().to_rfc3339(),
                finished_at: None,
                error: None,
            },
        );
        self.bus.emit(DiscoveryEvent::RunStarted {
            run_id: rid.clone(),
            disease_id,
            disease_name: disease.name.clone(),
        });

        match self.run_inner(&rid, &disease).await {
            Ok(organizations) => {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                self.finish(run_id, RunState::Completed, organizations.len(), None);
                self.bus.emit(DiscoveryEvent::RunCompleted {
                    run_id: rid.clone(),
                    disease_id,
                    organizations: organizations.len(),
                    elapsed_ms,
                });
                info!(
                    run_id = %rid,
                    organizations = organizations.len(),
                    elapsed_ms,
                    "discovery run completed"
                );
                Ok(RunReport {
                    run_id: rid,
                    disease_id,
                    organizations,
                    elapsed_ms,
                })
            }
            Err(e) => {
                self.finish(run_id, RunState::Failed, 0, Some(e.to_string()));
                self.bus.emit(DiscoveryEvent::RunFailed {
                    run_id: rid.clone(),
                    error: e.to_string(),
                });
                warn!(run_id = %rid, error = %e, "discovery run failed");
                Err(e)
            }
        }
    }

    async fn run_inner(&self, rid: &str, disease: &Disease) -> Result<Vec<Organization>> {
        let terms: Vec<String> = generate_terms(disease)
            .into_iter()
            .take(self.max_terms)
            .collect();
        self.bus.emit(DiscoveryEvent::TermsGenerated {
            run_id: rid.to_string(),
            count: terms.len(),
        });

        let mut accepted: Vec<NewOrganization> = Vec::new();
        for term in &terms {
            let results = match self.search.search(term).await {
                Ok(r) => r,
                Err(e) => {
                    warn!(term, error = %e, "search failed, skipping term");
                    Vec::new()
                }
            };
            self.bus.emit(DiscoveryEvent::SearchIssued {
                run_id: rid.to_string(),
                term: term.clone(),
                results: results.len(),
            });
            if results.is_empty() {
                debug!(term, "no results for term");
                continue;
            }

            for result in results.iter().take(self.max_results_per_term) {
                match self.process_result(rid, disease, result, &mut accepted).await {
                    Ok(()) => tokio::time::sleep(self.result_delay).await,
                    Err(e) => {
                        warn!(url = %result.url, error = %e, "result skipped");
                        self.bus.emit(DiscoveryEvent::ResultSkipped {
                            run_id: rid.to_string(),
                            url: result.url.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        // One transaction for the whole batch.
        let mut store = self.store.lock().await;
        let ids = store.insert_organizations(disease.id, &accepted)?;
        let mut organizations = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(org) = store.get_organization(id)? {
                organizations.push(org);
            }
        }
        Ok(organizations)
    }

    /// Fetch one search result, extract candidates, fold the usable ones
    /// into the run accumulator.
    async fn process_result(
        &self,
        rid: &str,
        disease: &Disease,
        result: &SearchResult,
        accepted: &mut Vec<NewOrganization>,
    ) -> Result<()> {
        let page = self.fetcher.fetch(&result.url).await?;
        self.bus.emit(DiscoveryEvent::PageFetched {
            run_id: rid.to_string(),
            url: page.url.clone(),
            chars: page.text.chars().count(),
        });

        let prompt = extractor::build_prompt(&disease.name, &page.text);
        let raw = self.llm.extract_json(&prompt).await?;
        let candidates = extractor::parse_candidates(&raw);
        let total = candidates.len();
        let mut added = 0usize;

        for candidate in candidates {
            let mut org = match candidate {
                Candidate::Recognized(org) => org,
                Candidate::Unrecognized(row) => {
                    debug!(row = %row, "dropping unrecognized extraction row");
                    continue;
                }
            };
            if dedup::is_duplicate(&org, accepted) {
                debug!(name = %org.name, "duplicate organization");
                continue;
            }
            if extractor::needs_url_recovery(org.url.as_deref()) {
                org.url = Some(extractor::recover_url(&page, &org.name));
            }
            org.source_url = Some(result.url.clone());
            accepted.push(org);
            added += 1;
        }

        self.bus.emit(DiscoveryEvent::Extracted {
            run_id: rid.to_string(),
            url: result.url.clone(),
            candidates: total,
            accepted: added,
        });
        Ok(())
    }

    /// Run discovery for every searchable disease, sequentially.
    pub async fn sweep(&self) -> Result<SweepReport> {
        let diseases = {
            let store = self.store.lock().await;
            taxonomy::searchable_diseases(&store, self.mode, &self.classifier)?
        };
        let total = diseases.len();
        info!(total, "sweep started");

        let mut completed = 0usize;
        let mut failed = 0usize;
        let mut organizations = 0usize;
        for disease in diseases {
            self.bus.emit(DiscoveryEvent::SweepProgress {
                completed,
                total,
                current: disease.name.clone(),
            });
            match self.run(Uuid::new_v4(), disease.id).await {
                Ok(report) => organizations += report.organizations.len(),
                Err(e) => {
                    warn!(disease = %disease.name, error = %e, "sweep run failed");
                    failed += 1;
                }
            }
            completed += 1;
        }
        self.bus.emit(DiscoveryEvent::SweepProgress {
            completed,
            total,
            current: String::new(),
        });
        info!(total, failed, organizations, "sweep finished");

        Ok(SweepReport {
            diseases: total,
            failed,
            organizations,
        })
    }

    fn finish(&self, run_id: Uuid, state: RunState, organizations: usize, error: Option<String>) {
        if let Some(mut status) = self.runs.get_mut(&run_id) {
            status.state = state;
            status.organizations = organizations;
            status.finished_at = Some(Utc::now().to_rfc3339());
            status.error = error;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::websearch::GoogleSearch;
    use crate::llm::OpenAiCompatClient;

    fn pipeline_with_empty_store() -> DiscoveryPipeline {
        let store = Arc::new(Mutex::new(RegistryStore::open_in_memory().unwrap()));
        let search = Arc::new(GoogleSearch::new(
            "key".into(),
            "cx".into(),
            "http://127.0.0.1:1/customsearch".into(),
        ));
        let llm = Arc::new(OpenAiCompatClient::new(
            "http://127.0.0.1:1/v1",
            "test-model",
            Duration::from_secs(1),
        ));
        DiscoveryPipeline::new(
            store,
            search,
            llm,
            Arc::new(HierarchyClassifier::default()),
            Arc::new(EventBus::new(16)),
            &Settings::default(),
        )
    }

    #[tokio::test]
    async fn test_run_unknown_disease() {
        let pipeline = pipeline_with_empty_store();
        let err = pipeline.run(Uuid::new_v4(), 12345).await.unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
        // never registered: the run could not start
        assert!(pipeline.all_runs().is_empty());
    }

    #[tokio::test]
    async fn test_sweep_over_empty_registry() {
        let pipeline = pipeline_with_empty_store();
        let report = pipeline.sweep().await.unwrap();
        assert_eq!(report.diseases, 0);
        assert_eq!(report.failed, 0);
        assert_eq!(report.organizations, 0);
    }

    #[test]
    fn test_run_status_serialization() {
        let status = RunStatus {
            run_id: "r1".into(),
            disease_id: 7,
            disease_name: "ファブリー病".into(),
            state: RunState::Running,
            organizations: 0,
            started_at: "2026-01-01T00:00:00Z".into(),
            finished_at: None,
            error: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["state"], "running");
        assert_eq!(json["disease_id"], 7);
    }
}
