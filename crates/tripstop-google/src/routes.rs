//! Routes API client: endpoint resolution, route computation, normalization.

use anyhow::Result;
use futures::future::try_join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tripstop_core::{
    format_distance, format_duration, parse_duration_seconds, BoundingBox, Coordinate,
    DurationValue, Leg, Route, Step, TravelMode, TripError, UpstreamError, WaypointRoute,
};

use crate::config::GoogleConfig;
use crate::geocoding::Geocoder;
use crate::http::{build_client, read_json, send_error, API_KEY_HEADER, FIELD_MASK_HEADER};

const ROUTES_FIELD_MASK: &str = "routes.duration,routes.distanceMeters,routes.polyline.encodedPolyline,routes.legs,routes.viewport";

/// HTTP client for the Google Routes API.
#[derive(Clone)]
pub struct RoutesClient {
    client: Client,
    url: String,
    api_key: String,
    geocoder: Geocoder,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComputeRoutesRequest {
    origin: RouteWaypoint,
    destination: RouteWaypoint,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    intermediates: Vec<RouteWaypoint>,
    travel_mode: TravelMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    routing_preference: Option<&'static str>,
    compute_alternative_routes: bool,
    polyline_quality: &'static str,
}

#[derive(Debug, Serialize)]
struct RouteWaypoint {
    location: WaypointLocation,
}

#[derive(Debug, Serialize)]
struct WaypointLocation {
    #[serde(rename = "latLng")]
    lat_lng: Coordinate,
}

impl From<Coordinate> for RouteWaypoint {
    fn from(coordinate: Coordinate) -> Self {
        Self {
            location: WaypointLocation {
                lat_lng: coordinate,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ComputeRoutesResponse {
    #[serde(default)]
    routes: Vec<ApiRoute>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRoute {
    distance_meters: Option<u64>,
    duration: Option<DurationValue>,
    polyline: Option<ApiPolyline>,
    #[serde(default)]
    legs: Vec<ApiLeg>,
    viewport: Option<BoundingBox>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPolyline {
    encoded_polyline: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiLeg {
    start_location: Option<ApiLocation>,
    end_location: Option<ApiLocation>,
    distance_meters: Option<u64>,
    duration: Option<DurationValue>,
    #[serde(default)]
    steps: Vec<ApiStep>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiLocation {
    lat_lng: Option<Coordinate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiStep {
    distance_meters: Option<u64>,
    static_duration: Option<DurationValue>,
    duration: Option<DurationValue>,
    navigation_instruction: Option<ApiNavigationInstruction>,
}

#[derive(Debug, Deserialize)]
struct ApiNavigationInstruction {
    instructions: Option<String>,
}

impl RoutesClient {
    pub fn new(config: &GoogleConfig) -> Result<Self> {
        let client = build_client(config.timeout)?;
        Ok(Self {
            geocoder: Geocoder::with_client(client.clone(), config),
            client,
            url: config.routes_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn geocoder(&self) -> &Geocoder {
        &self.geocoder
    }

    /// Compute a single-leg route between two endpoints.
    pub async fn compute_route(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Result<Route, TripError> {
        tracing::info!("Computing route from {} to {} ({:?})", origin, destination, mode);

        let (origin_coord, destination_coord) = futures::try_join!(
            self.geocoder.resolve(origin),
            self.geocoder.resolve(destination)
        )?;

        let payload = self
            .request_route(origin_coord, destination_coord, Vec::new(), mode)
            .await?;
        let route = normalize_route(payload, origin_coord, destination_coord, mode)?;

        tracing::info!("Route found: {} in {}", route.distance, route.duration);
        Ok(route)
    }

    /// Compute a route through intermediate waypoints. Every endpoint is
    /// resolved concurrently and all of them must resolve.
    pub async fn compute_route_with_waypoints(
        &self,
        origin: &str,
        destination: &str,
        waypoints: &[String],
        mode: TravelMode,
    ) -> Result<WaypointRoute, TripError> {
        tracing::info!(
            "Computing route with {} waypoints from {} to {}",
            waypoints.len(),
            origin,
            destination
        );

        let endpoints = std::iter::once(origin)
            .chain(std::iter::once(destination))
            .chain(waypoints.iter().map(String::as_str));
        let mut resolved = try_join_all(endpoints.map(|input| self.geocoder.resolve(input))).await?;
        let intermediates = resolved.split_off(2);
        let (origin_coord, destination_coord) = (resolved[0], resolved[1]);

        let payload = self
            .request_route(origin_coord, destination_coord, intermediates, mode)
            .await?;
        let route = normalize_waypoint_route(
            payload,
            origin_coord,
            destination_coord,
            waypoints.to_vec(),
            mode,
        )?;

        tracing::info!(
            "Multi-leg route: {} in {} over {} legs",
            route.distance,
            route.duration,
            route.legs.len()
        );
        Ok(route)
    }

    async fn request_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        intermediates: Vec<Coordinate>,
        mode: TravelMode,
    ) -> Result<ComputeRoutesResponse, UpstreamError> {
        let request = ComputeRoutesRequest {
            origin: origin.into(),
            destination: destination.into(),
            intermediates: intermediates.into_iter().map(RouteWaypoint::from).collect(),
            travel_mode: mode,
            // The API rejects a routing preference for non-driving modes.
            routing_preference: (mode == TravelMode::Drive).then_some("TRAFFIC_AWARE"),
            compute_alternative_routes: false,
            polyline_quality: "OVERVIEW",
        };

        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(FIELD_MASK_HEADER, ROUTES_FIELD_MASK)
            .json(&request)
            .send()
            .await
            .map_err(|err| send_error("routes", err))?;

        read_json("routes", response).await
    }
}

fn first_route(payload: ComputeRoutesResponse) -> Result<(ApiRoute, String), UpstreamError> {
    let route = payload
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::new(502, "no routes found in Routes API response"))?;
    let polyline = route
        .polyline
        .as_ref()
        .and_then(|polyline| polyline.encoded_polyline.clone())
        .filter(|polyline| !polyline.is_empty())
        .ok_or_else(|| UpstreamError::new(502, "route has no encoded polyline"))?;
    Ok((route, polyline))
}

fn leg_location(location: Option<&ApiLocation>) -> Option<Coordinate> {
    location.and_then(|location| location.lat_lng)
}

fn seconds_of(value: Option<&DurationValue>) -> u64 {
    value.and_then(parse_duration_seconds).unwrap_or(0)
}

/// Normalize the first route of a response into a [`Route`].
pub fn normalize_route(
    payload: ComputeRoutesResponse,
    origin: Coordinate,
    destination: Coordinate,
    mode: TravelMode,
) -> Result<Route, UpstreamError> {
    let (route, encoded_polyline) = first_route(payload)?;
    let leg = route.legs.into_iter().next();

    let distance_meters = route
        .distance_meters
        .or_else(|| leg.as_ref().and_then(|leg| leg.distance_meters))
        .unwrap_or(0);
    let duration_seconds = route
        .duration
        .as_ref()
        .or_else(|| leg.as_ref().and_then(|leg| leg.duration.as_ref()))
        .and_then(parse_duration_seconds)
        .unwrap_or(0);

    let (origin_coord, destination_coord, steps) = match leg {
        Some(leg) => (
            leg_location(leg.start_location.as_ref()).unwrap_or(origin),
            leg_location(leg.end_location.as_ref()).unwrap_or(destination),
            leg.steps.into_iter().map(normalize_step).collect(),
        ),
        None => (origin, destination, Vec::new()),
    };

    Ok(Route {
        origin_coord,
        destination_coord,
        distance_meters,
        duration_seconds,
        distance: format_distance(distance_meters),
        duration: format_duration(duration_seconds),
        mode: mode.as_display_str().to_string(),
        encoded_polyline,
        steps,
        bounds: route.viewport,
    })
}

fn normalize_step(step: ApiStep) -> Step {
    let distance_meters = step.distance_meters.unwrap_or(0);
    let duration_seconds = seconds_of(step.static_duration.as_ref().or(step.duration.as_ref()));
    Step {
        instruction: step
            .navigation_instruction
            .and_then(|instruction| instruction.instructions)
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| "Continue".to_string()),
        distance_meters,
        duration_seconds,
        distance: format_distance(distance_meters),
        duration: format_duration(duration_seconds),
    }
}

/// Normalize a multi-leg response into a [`WaypointRoute`].
pub fn normalize_waypoint_route(
    payload: ComputeRoutesResponse,
    origin: Coordinate,
    destination: Coordinate,
    waypoints: Vec<String>,
    mode: TravelMode,
) -> Result<WaypointRoute, UpstreamError> {
    let (route, encoded_polyline) = first_route(payload)?;

    let legs: Vec<Leg> = route
        .legs
        .iter()
        .map(|leg| {
            let distance_meters = leg.distance_meters.unwrap_or(0);
            let duration_seconds = seconds_of(leg.duration.as_ref());
            Leg {
                start: leg_location(leg.start_location.as_ref()).unwrap_or(origin),
                end: leg_location(leg.end_location.as_ref()).unwrap_or(destination),
                distance_meters,
                duration_seconds,
                distance: format_distance(distance_meters),
                duration: format_duration(duration_seconds),
            }
        })
        .collect();

    let total_distance_meters = route
        .distance_meters
        .unwrap_or_else(|| legs.iter().map(|leg| leg.distance_meters).sum());
    let total_duration_seconds = route
        .duration
        .as_ref()
        .and_then(parse_duration_seconds)
        .unwrap_or_else(|| legs.iter().map(|leg| leg.duration_seconds).sum());

    Ok(WaypointRoute {
        origin_coord: legs.first().map(|leg| leg.start).unwrap_or(origin),
        destination_coord: legs.last().map(|leg| leg.end).unwrap_or(destination),
        waypoints,
        total_distance_meters,
        total_duration_seconds,
        distance: format_distance(total_distance_meters),
        duration: format_duration(total_duration_seconds),
        mode: mode.as_display_str().to_string(),
        encoded_polyline,
        legs,
    })
}
