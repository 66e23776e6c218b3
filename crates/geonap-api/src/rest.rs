//! REST API handlers

use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use geonap_core::{ApiConfig, GeoNapError, JobRequest, JobSpec, PlanOutcome, RankedProvider};
use geonap_scheduler::{simulate_cost, Comparison, CostSimulation, ModelAvailability, Planner, DEFAULT_RUNS};
use geonap_store::{snapshot::SnapshotInfo, ProviderStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

/// Application state shared across handlers
pub struct AppState {
    pub planner: Planner,
    pub store: Arc<ProviderStore>,
}

type ApiError = (StatusCode, String);

/// Create the API router
pub fn create_router(planner: Planner, store: Arc<ProviderStore>) -> Router {
    let state = Arc::new(AppState { planner, store });

    Router::new()
        .route("/api/v1/plan", post(plan))
        .route("/api/v1/compare", post(compare))
        .route("/api/v1/simulate", post(simulate))
        .route("/api/v1/providers", get(list_providers))
        .route("/api/v1/models", get(list_models))
        .route("/api/v1/catalog/reload", post(reload_catalog))
        .route("/api/v1/status", get(get_status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS layer for the configured origins; an empty list or `*` allows any
pub fn cors_layer(config: &ApiConfig) -> CorsLayer {
    if config.cors_origins.is_empty() || config.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

fn error_response(err: GeoNapError) -> ApiError {
    let status = match &err {
        GeoNapError::Data(_) => StatusCode::UNPROCESSABLE_ENTITY,
        GeoNapError::Catalog(_) => StatusCode::SERVICE_UNAVAILABLE,
        GeoNapError::Config(_) | GeoNapError::Serialization(_) => StatusCode::BAD_REQUEST,
        GeoNapError::Io(_) | GeoNapError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Response for a planning run
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub run_id: Uuid,
    pub job: JobSpec,
    #[serde(flatten)]
    pub outcome: PlanOutcome,
}

/// Plan a job against the current catalog
async fn plan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JobRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    let job = req.into_spec();
    let snapshot = state.store.require().await.map_err(error_response)?;
    let run_id = Uuid::new_v4();

    info!(
        run_id = %run_id,
        gpus = job.required_gpus,
        r_max = job.max_rtt_ms,
        "Planning job"
    );

    let outcome = state.planner.plan_ranked(&job, snapshot.catalog.providers());
    Ok(Json(PlanResponse {
        run_id,
        job,
        outcome,
    }))
}

/// Request to compare a job with a model-filtered variant
#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub job: JobRequest,
    pub model: String,
}

/// Comparison with the model's availability at the base placement
#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub run_id: Uuid,
    #[serde(flatten)]
    pub comparison: Comparison,
    pub availability: Vec<ModelAvailability>,
}

/// Compare a base run against the same job restricted to one model
async fn compare(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, ApiError> {
    let job = req.job.into_spec();
    let snapshot = state.store.require().await.map_err(error_response)?;
    let run_id = Uuid::new_v4();

    info!(run_id = %run_id, model = %req.model, "Comparing job");

    let comparison = state
        .planner
        .compare_ranked(&job, snapshot.catalog.providers(), &req.model);
    let availability = snapshot
        .catalog
        .availability(&comparison.base.placement, &req.model);

    Ok(Json(CompareResponse {
        run_id,
        comparison,
        availability,
    }))
}

/// Request to simulate cost spread around a mean, or around a planned job
#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub job: Option<JobRequest>,
    #[serde(default)]
    pub runs: Option<usize>,
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Monte Carlo cost simulation
async fn simulate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SimulateRequest>,
) -> Result<Json<CostSimulation>, ApiError> {
    let mean = match (req.mean, req.job) {
        (Some(mean), _) => mean,
        (None, Some(job)) => {
            let snapshot = state.store.require().await.map_err(error_response)?;
            state
                .planner
                .plan_ranked(&job.into_spec(), snapshot.catalog.providers())
                .total_cost
        }
        (None, None) => {
            return Err((
                StatusCode::BAD_REQUEST,
                "Either 'mean' or 'job' is required".to_string(),
            ))
        }
    };

    let seed = req.seed.unwrap_or_else(rand::random);
    let summary = simulate_cost(mean, req.runs.unwrap_or(DEFAULT_RUNS), seed).map_err(error_response)?;
    Ok(Json(summary))
}

/// Provider listing filters
#[derive(Debug, Default, Deserialize)]
pub struct ProviderQuery {
    pub max_rtt: Option<f64>,
    pub model: Option<String>,
}

/// List ranked providers in catalog order
async fn list_providers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProviderQuery>,
) -> Result<Json<Vec<RankedProvider>>, ApiError> {
    let snapshot = state.store.require().await.map_err(error_response)?;
    let model = query.model.as_deref().and_then(geonap_core::normalize_model_filter);

    let providers = snapshot
        .catalog
        .providers()
        .iter()
        .filter(|p| query.max_rtt.map_or(true, |r| p.offer.rtt_ms <= r))
        .filter(|p| model.map_or(true, |m| p.offers_model(m)))
        .cloned()
        .collect();

    Ok(Json(providers))
}

/// List known accelerator models
async fn list_models(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>, ApiError> {
    let snapshot = state.store.require().await.map_err(error_response)?;
    Ok(Json(snapshot.catalog.gpu_models()))
}

/// Reload the catalog from its source
async fn reload_catalog(State(state): State<Arc<AppState>>) -> Result<Json<SnapshotInfo>, ApiError> {
    info!(source = %state.store.source_name(), "Reloading catalog");
    let snapshot = state.store.reload().await.map_err(error_response)?;
    Ok(Json(snapshot.info()))
}

/// System status response
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub source: String,
    pub catalog: Option<SnapshotInfo>,
}

/// Get system status
async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let catalog = state.store.current().await.map(|s| s.info());
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        source: state.store.source_name(),
        catalog,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use geonap_core::{CatalogPolicy, ProviderRecord};
    use geonap_store::MemorySource;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn records() -> Vec<ProviderRecord> {
        vec![
            ProviderRecord::new("aws", "mumbai", 3.0).with_rtt(5.0).with_gpu("H100"),
            ProviderRecord::new("azure", "mumbai", 2.2).with_rtt(12.0).with_gpu("A100"),
            ProviderRecord::new("vast", "global", 0.5).with_rtt(160.0).with_gpu("RTX 4090"),
        ]
    }

    async fn loaded_router() -> Router {
        let store = Arc::new(ProviderStore::new(
            Arc::new(MemorySource::new(records())),
            CatalogPolicy::default(),
        ));
        store.reload().await.unwrap();
        create_router(Planner::default(), store)
    }

    fn empty_router() -> Router {
        let store = Arc::new(ProviderStore::new(
            Arc::new(MemorySource::default()),
            CatalogPolicy::default(),
        ));
        create_router(Planner::default(), store)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_plan_endpoint() {
        let app = loaded_router().await;
        let response = app
            .oneshot(post_json("/api/v1/plan", json!({"gpus": "12", "r_max": 20})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert!(body["run_id"].is_string());
        assert_eq!(body["job"]["required_gpus"], 12);
        assert_eq!(body["forbidden"], json!(["vast_global"]));
        assert!(body["total_cost"].as_f64().unwrap() > 0.0);
        assert_eq!(body["placement"]["unmet_demand"], 0);
    }

    #[tokio::test]
    async fn test_plan_without_catalog_is_unavailable() {
        let app = empty_router();
        let response = app
            .oneshot(post_json("/api/v1/plan", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_reload_with_invalid_records_is_unprocessable() {
        let mut bad = records();
        bad.push(ProviderRecord {
            provider: None,
            ..ProviderRecord::new("x", "y", 1.0)
        });
        let store = Arc::new(ProviderStore::new(
            Arc::new(MemorySource::new(bad)),
            CatalogPolicy::default(),
        ));
        let app = create_router(Planner::default(), store);

        let response = app
            .oneshot(post_json("/api/v1/catalog/reload", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_compare_endpoint() {
        let app = loaded_router().await;
        let response = app
            .oneshot(post_json(
                "/api/v1/compare",
                json!({"job": {"gpus": 8}, "model": "H100"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["model"], "H100");
        assert!(body["delta"]["total_cost"].is_number());
        assert_eq!(body["availability"][0]["provider"], "azure_mumbai");
        assert_eq!(body["availability"][0]["available"], false);
    }

    #[tokio::test]
    async fn test_simulate_endpoint() {
        let app = loaded_router().await;
        let response = app
            .oneshot(post_json(
                "/api/v1/simulate",
                json!({"mean": 1000.0, "runs": 200, "seed": 9}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["runs"], 200);
        assert_eq!(body["seed"], 9);
    }

    #[tokio::test]
    async fn test_simulate_huge_runs_clamped() {
        let app = loaded_router().await;
        let response = app
            .oneshot(post_json(
                "/api/v1/simulate",
                json!({"mean": 100.0, "runs": u64::MAX, "seed": 1}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["runs"], geonap_scheduler::MAX_RUNS);
    }

    #[tokio::test]
    async fn test_simulate_requires_mean_or_job() {
        let app = loaded_router().await;
        let response = app
            .oneshot(post_json("/api/v1/simulate", json!({"runs": 10})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_providers_filtered_by_rtt() {
        let app = loaded_router().await;
        let response = app.oneshot(get_request("/api/v1/providers?max_rtt=20")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["aws_mumbai", "azure_mumbai"]);
    }

    #[tokio::test]
    async fn test_models_and_status() {
        let app = loaded_router().await;
        let response = app.clone().oneshot(get_request("/api/v1/models")).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body, json!(["A100", "H100", "RTX 4090"]));

        let response = app.oneshot(get_request("/api/v1/status")).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["source"], "memory");
        assert_eq!(body["catalog"]["providers"], 3);
    }

    #[test]
    fn test_cors_layer_from_config() {
        let _any = cors_layer(&ApiConfig::default());
        let _listed = cors_layer(&ApiConfig {
            cors_origins: vec!["http://localhost:8501".to_string()],
            ..ApiConfig::default()
        });
    }
}
