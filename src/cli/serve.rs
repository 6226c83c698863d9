//! Start the registry HTTP server.

use crate::config::Settings;
use crate::discovery::{DiscoveryPipeline, GoogleSearch, WebSearch};
use crate::events::EventBus;
use crate::llm::{LlmClient, OpenAiCompatClient};
use crate::registry::RegistryStore;
use crate::rest::{self, AppState};
use crate::taxonomy::HierarchyClassifier;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Event bus capacity. Plenty for one run's worth of events per subscriber.
const EVENT_CAPACITY: usize = 256;

/// Wire up the store, classifier, providers, and pipeline from settings.
///
/// Shared by `serve` and the one-shot discovery commands so they all see
/// the same construction order.
pub fn build_state(settings: Settings) -> Result<Arc<AppState>> {
    let store = Arc::new(Mutex::new(RegistryStore::open(&settings.database_path)?));
    let classifier = Arc::new(HierarchyClassifier::default());
    let bus = Arc::new(EventBus::new(EVENT_CAPACITY));

    let search: Arc<dyn WebSearch> = Arc::new(GoogleSearch::new(
        settings.google_api_key.clone(),
        settings.google_cse_id.clone(),
        settings.google_endpoint.clone(),
    ));
    let llm: Arc<dyn LlmClient> = Arc::new(OpenAiCompatClient::new(
        &settings.llm_base_url,
        &settings.llm_model,
        Duration::from_secs(settings.llm_timeout_secs),
    ));
    let pipeline = Arc::new(DiscoveryPipeline::new(
        Arc::clone(&store),
        Arc::clone(&search),
        Arc::clone(&llm),
        Arc::clone(&classifier),
        Arc::clone(&bus),
        &settings,
    ));

    Ok(Arc::new(AppState {
        store,
        settings,
        classifier,
        bus,
        pipeline,
        llm,
    }))
}

/// Initialize tracing for long-running commands.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nando=info".parse().unwrap()),
        )
        .init();
}

/// Open the store and serve the REST API until interrupted.
pub async fn run(port: Option<u16>) -> Result<()> {
    init_tracing();

    let settings = Settings::from_env();
    let port = port.unwrap_or(settings.http_port);
    info!(
        "starting nando v{} (db: {})",
        env!("CARGO_PKG_VERSION"),
        settings.database_path.display()
    );
    if !settings.search_configured() {
        warn!("GOOGLE_API_KEY / GOOGLE_CSE_ID not set, discovery endpoints will refuse");
    }

    let state = build_state(settings)?;
    rest::start(port, state).await
}
