//! REST API routes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{StatusCode, Uri},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tripstop_core::{Route, TravelMode, TripError, WaypointRoute};

use crate::api::error::ApiError;
use crate::api::request_id::ensure_request_id;
use crate::state::AppState;
use crate::stop_planner::{StopsRequest, StopsResponse};

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/api/route", post(plan_route))
        .route("/api/route/waypoints", post(plan_route_with_waypoints))
        .route("/api/places/search", post(search_places))
        .fallback(not_found)
        .layer(middleware::from_fn(ensure_request_id))
}

// === Request types ===

#[derive(Debug, Default, Deserialize)]
pub struct RouteRequest {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    pub mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WaypointsRequest {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub waypoints: Vec<String>,
    pub mode: Option<String>,
}

fn require_endpoints(origin: &str, destination: &str) -> Result<(), ApiError> {
    if origin.trim().is_empty() || destination.trim().is_empty() {
        return Err(TripError::validation("Origin and destination are required").into());
    }
    Ok(())
}

fn travel_mode(mode: Option<&str>) -> TravelMode {
    mode.map(TravelMode::from_request).unwrap_or_default()
}

// === Handlers ===

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let gemini = if state.stops.curation_enabled() {
        "Gemini AI API"
    } else {
        "Not Available"
    };
    Json(json!({
        "status": "OK",
        "timestamp": Utc::now().to_rfc3339(),
        "service": "tripstop",
        "version": env!("CARGO_PKG_VERSION"),
        "apis": {
            "routes": "Google Maps Routes API",
            "places": "Google Places API",
            "gemini": gemini,
        }
    }))
}

async fn plan_route(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RouteRequest>, JsonRejection>,
) -> Result<Json<Route>, ApiError> {
    let Json(request) = payload?;
    require_endpoints(&request.origin, &request.destination)?;

    let mode = travel_mode(request.mode.as_deref());
    let route = state
        .routes
        .compute_route(&request.origin, &request.destination, mode)
        .await?;
    Ok(Json(route))
}

async fn plan_route_with_waypoints(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WaypointsRequest>, JsonRejection>,
) -> Result<Json<WaypointRoute>, ApiError> {
    let Json(request) = payload?;
    require_endpoints(&request.origin, &request.destination)?;
    if request.waypoints.iter().any(|waypoint| waypoint.trim().is_empty()) {
        return Err(TripError::validation("Waypoints must not be empty").into());
    }

    let mode = travel_mode(request.mode.as_deref());
    let route = state
        .routes
        .compute_route_with_waypoints(&request.origin, &request.destination, &request.waypoints, mode)
        .await?;
    Ok(Json(route))
}

async fn search_places(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<StopsRequest>, JsonRejection>,
) -> Result<Json<StopsResponse>, ApiError> {
    let Json(request) = payload?;
    tracing::info!("Places search for \"{}\"", request.text_query);

    let response = state.stops.plan_and_curate_stops(request).await?;
    Ok(Json(response))
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    let message = if uri.path().starts_with("/api/") || uri.path() == "/api" {
        "API route not found"
    } else {
        "Route not found"
    };
    tracing::debug!("{}: {}", message, uri.path());
    (StatusCode::NOT_FOUND, Json(json!({ "error": message })))
}
