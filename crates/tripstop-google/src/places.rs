//! Places API (New) text search along a route polyline.

use anyhow::Result;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tripstop_core::{
    convert_seconds_to_minutes, format_distance, BoundingBox, Coordinate, DurationValue, Place,
    SearchParams, SegmentContext, TravelMode, TripError, UpstreamError,
};

use crate::config::GoogleConfig;
use crate::http::{build_client, read_json, send_error, API_KEY_HEADER, FIELD_MASK_HEADER};

/// Result floor for segment-scoped searches.
pub const SEGMENT_MIN_RESULTS: u32 = 20;
/// Result floor for single-shot searches, which cover the whole route at once.
pub const SINGLE_SHOT_MIN_RESULTS: u32 = 30;

const PLACES_FIELD_MASK: &str = "places.id,places.displayName,places.formattedAddress,places.location,places.primaryType,places.rating,places.userRatingCount,places.currentOpeningHours,places.priceLevel";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSearchResult {
    pub places: Vec<Place>,
    pub total_results: usize,
}

/// HTTP client for along-route place search.
#[derive(Clone)]
pub struct PlacesClient {
    client: Client,
    url: String,
    api_key: String,
    bias_region: BoundingBox,
    bias_radius_m: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchTextRequest<'a> {
    text_query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    search_along_route_parameters: Option<SearchAlongRoute<'a>>,
    max_result_count: u32,
    open_now: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    included_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    routing_parameters: Option<RoutingParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location_bias: Option<LocationBias>,
}

#[derive(Debug, Serialize)]
struct SearchAlongRoute<'a> {
    polyline: EncodedPolyline<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EncodedPolyline<'a> {
    encoded_polyline: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoutingParameters {
    origin: Coordinate,
    travel_mode: TravelMode,
    routing_preference: &'static str,
}

#[derive(Debug, Serialize)]
struct LocationBias {
    circle: Circle,
}

#[derive(Debug, Serialize)]
struct Circle {
    center: Coordinate,
    radius: f64,
}

/// Raw search response. Entries stay untyped so one malformed entry cannot
/// fail the whole search.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchTextResponse {
    #[serde(default)]
    pub places: Vec<Value>,
    #[serde(default)]
    pub routing_summaries: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPlace {
    #[serde(default, deserialize_with = "lenient")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    display_name: Option<LocalizedText>,
    #[serde(default, deserialize_with = "lenient")]
    formatted_address: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    location: Option<Coordinate>,
    #[serde(default, deserialize_with = "lenient")]
    primary_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    user_rating_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    current_opening_hours: Option<OpeningHours>,
    price_level: Option<Value>,
}

/// A field with an unexpected shape decodes as unset instead of failing the
/// whole place.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Deserialize)]
struct LocalizedText {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpeningHours {
    open_now: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRoutingSummary {
    #[serde(default)]
    legs: Vec<ApiSummaryLeg>,
    directions_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSummaryLeg {
    duration: Option<DurationValue>,
    distance_meters: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LocateResponse {
    #[serde(default)]
    places: Vec<LocatedPlace>,
}

#[derive(Debug, Deserialize)]
struct LocatedPlace {
    location: Option<Coordinate>,
}

impl PlacesClient {
    pub fn new(config: &GoogleConfig) -> Result<Self> {
        Ok(Self::with_client(build_client(config.timeout)?, config))
    }

    pub(crate) fn with_client(client: Client, config: &GoogleConfig) -> Self {
        Self {
            client,
            url: config.places_url.clone(),
            api_key: config.api_key.clone(),
            bias_region: config.bias_region,
            bias_radius_m: config.bias_radius_m,
        }
    }

    /// Search for places along `params.encoded_polyline`.
    ///
    /// Detour fields are only populated when `params.origin` is set. Places
    /// from a segment-scoped search are tagged with the segment index.
    pub async fn search(&self, params: &SearchParams) -> Result<PlaceSearchResult, TripError> {
        params.validate()?;

        let request = self.build_request(params);
        let field_mask = if params.origin.is_some() {
            format!("{PLACES_FIELD_MASK},routingSummaries")
        } else {
            PLACES_FIELD_MASK.to_string()
        };

        tracing::debug!(
            "Places search \"{}\" (max {}, segment {:?})",
            request.text_query,
            request.max_result_count,
            params.segment.as_ref().map(|segment| segment.index)
        );

        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(FIELD_MASK_HEADER, field_mask)
            .json(&request)
            .send()
            .await
            .map_err(|err| send_error("places search", err))?;

        let payload: SearchTextResponse = read_json("places search", response).await?;
        let places = normalize_places(
            payload,
            params.origin.is_some(),
            params.segment.as_ref().map(|segment| segment.index),
        );

        tracing::info!("Places search \"{}\" returned {} places", params.text_query, places.len());
        Ok(PlaceSearchResult {
            total_results: places.len(),
            places,
        })
    }

    /// Top text-search hit for a free-text address, used when the geocoder
    /// refuses the request.
    pub async fn locate(&self, address: &str) -> Result<Option<Coordinate>, UpstreamError> {
        let request = SearchTextRequest {
            text_query: address.to_string(),
            search_along_route_parameters: None,
            max_result_count: 1,
            open_now: false,
            included_type: None,
            routing_parameters: None,
            location_bias: None,
        };

        let response = self
            .client
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(FIELD_MASK_HEADER, "places.location")
            .json(&request)
            .send()
            .await
            .map_err(|err| send_error("places locate", err))?;

        let payload: LocateResponse = read_json("places locate", response).await?;
        Ok(payload.places.into_iter().find_map(|place| place.location))
    }

    pub(crate) fn build_request<'a>(&self, params: &'a SearchParams) -> SearchTextRequest<'a> {
        let (text_query, max_result_count, location_bias) = match &params.segment {
            Some(segment) => (
                format!("{} {} segment", params.text_query.trim(), segment.label),
                params.max_result_count.max(SEGMENT_MIN_RESULTS),
                Some(self.segment_bias(segment)),
            ),
            None => (
                params.text_query.trim().to_string(),
                params.max_result_count.max(SINGLE_SHOT_MIN_RESULTS),
                None,
            ),
        };

        SearchTextRequest {
            text_query,
            search_along_route_parameters: Some(SearchAlongRoute {
                polyline: EncodedPolyline {
                    encoded_polyline: params.encoded_polyline.as_str(),
                },
            }),
            max_result_count,
            open_now: params.open_now,
            included_type: params
                .included_type
                .as_deref()
                .filter(|value| !value.trim().is_empty()),
            routing_parameters: params.origin.map(|origin| RoutingParameters {
                origin,
                travel_mode: TravelMode::Drive,
                routing_preference: "TRAFFIC_AWARE_OPTIMAL",
            }),
            location_bias,
        }
    }

    /// Bias circle placed by linear interpolation across the bias region at
    /// the segment's share of the trip. Approximate by construction: it does
    /// not follow the polyline.
    fn segment_bias(&self, segment: &SegmentContext) -> LocationBias {
        let progress = segment.progress();
        let low = self.bias_region.low;
        let high = self.bias_region.high;
        LocationBias {
            circle: Circle {
                center: Coordinate::new(
                    low.latitude + (high.latitude - low.latitude) * progress,
                    low.longitude + (high.longitude - low.longitude) * progress,
                ),
                radius: self.bias_radius_m,
            },
        }
    }
}

/// Normalize a search response, zipping places with routing summaries by
/// position. Missing or malformed summaries leave the detour fields unset.
pub fn normalize_places(
    payload: SearchTextResponse,
    with_detours: bool,
    segment_index: Option<usize>,
) -> Vec<Place> {
    if with_detours && payload.routing_summaries.is_empty() && !payload.places.is_empty() {
        tracing::warn!("Places response has no routing summaries; detours unavailable");
    }

    payload
        .places
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| {
            let place: ApiPlace = match serde_json::from_value(raw) {
                Ok(place) => place,
                Err(err) => {
                    tracing::warn!("Skipping malformed place #{}: {}", index, err);
                    return None;
                }
            };
            let summary = if with_detours {
                payload
                    .routing_summaries
                    .get(index)
                    .and_then(|value| serde_json::from_value::<ApiRoutingSummary>(value.clone()).ok())
            } else {
                None
            };
            Some(normalize_place(place, summary, segment_index))
        })
        .collect()
}

fn normalize_place(
    place: ApiPlace,
    summary: Option<ApiRoutingSummary>,
    segment_index: Option<usize>,
) -> Place {
    let (leg, directions_uri) = match summary {
        Some(summary) => (summary.legs.into_iter().next(), summary.directions_uri),
        None => (None, None),
    };
    let detour_seconds = leg
        .as_ref()
        .and_then(|leg| leg.duration.as_ref())
        .and_then(DurationValue::seconds);
    let detour_minutes = convert_seconds_to_minutes(leg.as_ref().and_then(|leg| leg.duration.as_ref()));
    let detour_meters = leg.as_ref().and_then(|leg| leg.distance_meters);

    Place {
        id: place.id.unwrap_or_default(),
        name: place
            .display_name
            .and_then(|name| name.text)
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| "Unknown".to_string()),
        address: place
            .formatted_address
            .filter(|address| !address.trim().is_empty())
            .unwrap_or_else(|| "Address not available".to_string()),
        location: place.location.filter(Coordinate::is_valid),
        primary_type: place.primary_type.unwrap_or_else(|| "Unknown".to_string()),
        rating: place.rating.filter(|rating| rating.is_finite() && *rating > 0.0),
        user_rating_count: place.user_rating_count.unwrap_or(0),
        is_open: place
            .current_opening_hours
            .and_then(|hours| hours.open_now)
            .unwrap_or(false),
        price_level: place.price_level.as_ref().and_then(price_level),
        detour_seconds,
        detour_minutes,
        detour_meters,
        detour_distance: detour_meters.map(format_distance),
        directions_uri: directions_uri.filter(|uri| !uri.is_empty()),
        segment_index,
    }
}

/// `PRICE_LEVEL_*` enum names (or bare numbers) to 0-4.
fn price_level(value: &Value) -> Option<u8> {
    match value {
        Value::Number(number) => number.as_u64().filter(|level| *level <= 4).map(|level| level as u8),
        Value::String(name) => match name.as_str() {
            "PRICE_LEVEL_FREE" => Some(0),
            "PRICE_LEVEL_INEXPENSIVE" => Some(1),
            "PRICE_LEVEL_MODERATE" => Some(2),
            "PRICE_LEVEL_EXPENSIVE" => Some(3),
            "PRICE_LEVEL_VERY_EXPENSIVE" => Some(4),
            _ => None,
        },
        _ => None,
    }
}
