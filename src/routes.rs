use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    cache::{LineListing, SnapshotCache, SnapshotStatus},
    config::Config,
    feed::types::VehiclePosition,
    filter::{BoundingBox, VehicleFilter},
};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub cache: Arc<SnapshotCache>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleQuery {
    #[serde(alias = "linha")]
    pub line: Option<String>,
    pub lat_min: Option<f64>,
    pub lat_max: Option<f64>,
    pub lon_min: Option<f64>,
    pub lon_max: Option<f64>,
    pub since: Option<i64>,
}

impl From<&VehicleQuery> for VehicleFilter {
    fn from(query: &VehicleQuery) -> Self {
        VehicleFilter::new(
            query.line.as_deref(),
            BoundingBox::from_bounds(query.lat_min, query.lat_max, query.lon_min, query.lon_max),
        )
        .with_since(query.since)
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub upstream: String,
    pub snapshot: Option<SnapshotStatus>,
}

// Route handlers
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        upstream: state.config.upstream_url.clone(),
        snapshot: state.cache.status().await,
    })
}

pub async fn get_vehicles(
    State(state): State<AppState>,
    Query(params): Query<VehicleQuery>,
) -> Result<Json<Vec<VehiclePosition>>, StatusCode> {
    let filter = VehicleFilter::from(&params);

    match state.cache.query(&filter).await {
        Ok(vehicles) => Ok(Json(vehicles)),
        Err(e) => {
            tracing::error!("Vehicle query failed: {}", e);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

pub async fn get_lines(State(state): State<AppState>) -> Result<Json<LineListing>, StatusCode> {
    match state.cache.lines().await {
        Ok(listing) => Ok(Json(listing)),
        Err(e) => {
            tracing::error!("Line listing failed: {}", e);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

// Create the router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/onibus", get(get_vehicles))
        .route("/vehicles", get(get_vehicles))
        .route("/lines", get(get_lines))
        .with_state(state)
}
