// Copyright 2026 NANDO Registry Contributors
// SPDX-License-Identifier: Apache-2.0

//! HTTP REST API for the registry.
//!
//! Curation (disease lookup and edits, searchable flags, CSV exchange),
//! discovery (runs, sweep, extracted organizations), provider status, and
//! a live event stream over SSE. Handlers share one [`AppState`] and map
//! [`RegistryError`] onto HTTP statuses in a single place.

use crate::config::Settings;
use crate::discovery::DiscoveryPipeline;
use crate::error::RegistryError;
use crate::events::{self, EventBus};
use crate::llm::LlmClient;
use crate::registry::{Disease, DiseaseUpdate, RegistryStore, VerificationStatus};
use crate::tabular;
use crate::taxonomy::{self, HierarchyClassifier};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

/// Everything the handlers need, shared behind an Arc.
pub struct AppState {
    pub store: Arc<Mutex<RegistryStore>>,
    pub settings: Settings,
    pub classifier: Arc<HierarchyClassifier>,
    pub bus: Arc<EventBus>,
    pub pipeline: Arc<DiscoveryPipeline>,
    pub llm: Arc<dyn LlmClient>,
}

/// Build the axum Router with all REST endpoints.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/diseases", get(list_diseases))
        .route("/api/v1/diseases/search", get(search_diseases))
        .route(
            "/api/v1/diseases/external/:external_id",
            get(get_disease_by_external),
        )
        .route("/api/v1/diseases/:id", get(get_disease).put(update_disease))
        .route("/api/v1/diseases/:id/hierarchy", get(disease_hierarchy))
        .route("/api/v1/diseases/:id/searchable", put(set_searchable))
        .route(
            "/api/v1/diseases/searchable/batch",
            post(set_searchable_batch),
        )
        .route("/api/v1/taxonomy/stats", get(taxonomy_stats))
        .route("/api/v1/taxonomy/searchable", get(taxonomy_searchable))
        .route("/api/v1/import/diseases", post(import_diseases))
        .route("/api/v1/export/diseases", get(export_diseases))
        .route("/api/v1/import/searchable", post(import_searchable))
        .route("/api/v1/discovery/sweep", post(start_sweep))
        .route("/api/v1/discovery/runs", get(list_runs))
        .route("/api/v1/discovery/runs/:run_id", get(get_run))
        .route("/api/v1/discovery/:disease_id", post(start_discovery))
        .route("/api/v1/organizations/:disease_id", get(list_organizations))
        .route(
            "/api/v1/organizations/:org_id/status",
            put(set_organization_status),
        )
        .route("/api/v1/llm/health", get(llm_health))
        .route("/api/v1/llm/models", get(llm_models))
        .route("/api/v1/events", get(events_sse))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the given port.
pub async fn start(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("registry API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ── Errors ──────────────────────────────────────────────────────

/// Response wrapper carrying the status mapping for [`RegistryError`].
struct ApiError(RegistryError);

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self.0 {
            RegistryError::NotFound { .. } => (StatusCode::NOT_FOUND, "E_NOT_FOUND"),
            RegistryError::Validation(_) => (StatusCode::BAD_REQUEST, "E_VALIDATION"),
            RegistryError::ExternalService { .. } => (StatusCode::BAD_GATEWAY, "E_EXTERNAL"),
            RegistryError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "E_INTERNAL"),
        };
        let body = Json(json!({
            "error": { "code": code, "message": self.0.to_string() }
        }));
        (status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

// ── Curation Handlers ───────────────────────────────────────────

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

#[derive(Deserialize, Default)]
struct ListParams {
    limit: Option<i64>,
    offset: Option<i64>,
    #[serde(default)]
    searchable_only: bool,
}

async fn list_diseases(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<Value>> {
    let store = state.store.lock().await;
    let diseases = store.list_diseases(
        params.limit.unwrap_or(-1),
        params.offset.unwrap_or(0),
        params.searchable_only,
    )?;
    let total = store.count_diseases()?;
    Ok(Json(json!({ "diseases": diseases, "total": total })))
}

#[derive(Deserialize)]
struct SearchParams {
    q: String,
}

async fn search_diseases(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Value>> {
    let store = state.store.lock().await;
    let diseases = store.search_diseases(&params.q)?;
    let count = diseases.len();
    Ok(Json(json!({ "diseases": diseases, "count": count })))
}

async fn get_disease(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Disease>> {
    let store = state.store.lock().await;
    let disease = store
        .get_disease(id)?
        .ok_or_else(|| RegistryError::not_found("disease", id))?;
    Ok(Json(disease))
}

async fn get_disease_by_external(
    State(state): State<Arc<AppState>>,
    Path(external_id): Path<String>,
) -> ApiResult<Json<Disease>> {
    let store = state.store.lock().await;
    let disease = store
        .get_disease_by_external_id(&external_id)?
        .ok_or_else(|| RegistryError::not_found("disease", &external_id))?;
    Ok(Json(disease))
}

async fn update_disease(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(update): Json<DiseaseUpdate>,
) -> ApiResult<Json<Disease>> {
    let store = state.store.lock().await;
    let disease = store
        .update_disease(id, &update)?
        .ok_or_else(|| RegistryError::not_found("disease", id))?;
    Ok(Json(disease))
}

async fn disease_hierarchy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<taxonomy::HierarchyInfo>> {
    let store = state.store.lock().await;
    let info = taxonomy::hierarchy_info(&store, &state.classifier, id)?;
    Ok(Json(info))
}

#[derive(Deserialize)]
struct SearchableBody {
    is_searchable: bool,
}

async fn set_searchable(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<SearchableBody>,
) -> ApiResult<Json<Value>> {
    let store = state.store.lock().await;
    if !store.set_searchable(id, body.is_searchable)? {
        return Err(RegistryError::not_found("disease", id).into());
    }
    Ok(Json(json!({ "id": id, "is_searchable": body.is_searchable })))
}

#[derive(Deserialize)]
struct SearchableEntry {
    id: i64,
    is_searchable: bool,
}

async fn set_searchable_batch(
    State(state): State<Arc<AppState>>,
    Json(entries): Json<Vec<SearchableEntry>>,
) -> ApiResult<Json<Value>> {
    let updates: Vec<(i64, bool)> = entries.iter().map(|e| (e.id, e.is_searchable)).collect();
    let mut store = state.store.lock().await;
    let updated = store.set_searchable_batch(&updates)?;
    Ok(Json(json!({ "updated": updated })))
}

async fn taxonomy_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let store = state.store.lock().await;
    let stats = taxonomy::hierarchy_stats(&store, state.settings.classifier_mode, &state.classifier)?;
    Ok(Json(serde_json::to_value(stats).unwrap_or_default()))
}

async fn taxonomy_searchable(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let store = state.store.lock().await;
    let diseases =
        taxonomy::searchable_diseases(&store, state.settings.classifier_mode, &state.classifier)?;
    let count = diseases.len();
    Ok(Json(json!({
        "mode": state.settings.classifier_mode.as_str(),
        "count": count,
        "diseases": diseases,
    })))
}

// ── CSV Import/Export ───────────────────────────────────────────

async fn import_diseases(
    State(state): State<Arc<AppState>>,
    body: String,
) -> ApiResult<Json<tabular::ImportOutcome>> {
    let mut store = state.store.lock().await;
    let outcome = tabular::import_diseases(&mut store, &body)?;
    Ok(Json(outcome))
}

async fn export_diseases(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let store = state.store.lock().await;
    let csv = tabular::export_searchable(&store)?;
    Ok((
        [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
        csv,
    ))
}

async fn import_searchable(
    State(state): State<Arc<AppState>>,
    body: String,
) -> ApiResult<Json<Value>> {
    let mut store = state.store.lock().await;
    let updated = tabular::import_searchable(&mut store, &body)?;
    Ok(Json(json!({ "updated": updated })))
}

// ── Discovery Handlers ──────────────────────────────────────────

async fn start_discovery(
    State(state): State<Arc<AppState>>,
    Path(disease_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    if !state.settings.search_configured() {
        return Err(RegistryError::external(
            "google search",
            "GOOGLE_API_KEY / GOOGLE_CSE_ID not configured",
        )
        .into());
    }
    {
        let store = state.store.lock().await;
        store
            .get_disease(disease_id)?
            .ok_or_else(|| RegistryError::not_found("disease", disease_id))?;
    }

    let run_id = Uuid::new_v4();
    let pipeline = Arc::clone(&state.pipeline);
    tokio::spawn(async move {
        if let Err(e) = pipeline.run(run_id, disease_id).await {
            tracing::warn!(%run_id, "discovery run failed: {e}");
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "run_id": run_id.to_string(), "disease_id": disease_id })),
    ))
}

async fn start_sweep(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    if !state.settings.search_configured() {
        return Err(RegistryError::external(
            "google search",
            "GOOGLE_API_KEY / GOOGLE_CSE_ID not configured",
        )
        .into());
    }

    let pipeline = Arc::clone(&state.pipeline);
    tokio::spawn(async move {
        match pipeline.sweep().await {
            Ok(report) => tracing::info!(
                diseases = report.diseases,
                organizations = report.organizations,
                "sweep finished"
            ),
            Err(e) => tracing::warn!("sweep failed: {e}"),
        }
    });

    Ok((StatusCode::ACCEPTED, Json(json!({ "status": "started" }))))
}

async fn list_runs(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "runs": state.pipeline.all_runs() }))
}

async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = Uuid::parse_str(&run_id)
        .map_err(|_| RegistryError::Validation(format!("invalid run id: {run_id}")))?;
    let status = state
        .pipeline
        .run_status(&id)
        .ok_or_else(|| RegistryError::not_found("run", &run_id))?;
    Ok(Json(serde_json::to_value(status).unwrap_or_default()))
}

async fn list_organizations(
    State(state): State<Arc<AppState>>,
    Path(disease_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let store = state.store.lock().await;
    store
        .get_disease(disease_id)?
        .ok_or_else(|| RegistryError::not_found("disease", disease_id))?;
    let organizations = store.organizations_for_disease(disease_id)?;
    let count = organizations.len();
    Ok(Json(json!({
        "disease_id": disease_id,
        "count": count,
        "organizations": organizations,
    })))
}

#[derive(Deserialize)]
struct StatusBody {
    verification_status: String,
}

async fn set_organization_status(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<Value>> {
    let status = VerificationStatus::parse(&body.verification_status).ok_or_else(|| {
        RegistryError::Validation(format!(
            "invalid verification status: {}",
            body.verification_status
        ))
    })?;
    let store = state.store.lock().await;
    if !store.set_organization_status(org_id, status)? {
        return Err(RegistryError::not_found("organization", org_id).into());
    }
    Ok(Json(
        json!({ "id": org_id, "verification_status": status.as_str() }),
    ))
}

// ── Provider Status ─────────────────────────────────────────────

async fn llm_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let reachable = state.llm.health().await;
    Json(json!({
        "reachable": reachable,
        "model": state.llm.model_name(),
    }))
}

async fn llm_models(State(state): State<Arc<AppState>>) -> Json<Value> {
    let models = state.llm.models().await;
    Json(json!({ "models": models }))
}

// ── Event Stream ────────────────────────────────────────────────

/// SSE query parameters.
#[derive(Deserialize, Default)]
struct EventsParams {
    run_id: Option<String>,
}

/// Server-Sent Events endpoint for real-time event streaming.
///
/// Subscribes to the global event bus and streams events as SSE.
/// Optionally filters to a single run via `?run_id=`.
async fn events_sse(
    Query(params): Query<EventsParams>,
    State(state): State<Arc<AppState>>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.bus.subscribe();
    let run_filter = params.run_id;

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(ref run_id) = run_filter {
                        if !events::event_matches_run(&event, run_id) {
                            continue;
                        }
                    }
                    if let Ok(json) = serde_json::to_string(&event) {
                        yield Ok(Event::default().data(json));
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                    // Slow consumer missed events, keep streaming
                    continue;
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(axum::response::sse::KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (
                ApiError(RegistryError::not_found("disease", 1)),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError(RegistryError::Validation("bad".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError(RegistryError::external("llm", "down")),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ApiError(RegistryError::Persistence(
                    rusqlite::Error::QueryReturnedNoRows,
                )),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_health_shape() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
