//! Core data models for routes, places and curated stops.

use serde::{Deserialize, Serialize};

use crate::error::TripError;
use crate::segments::RouteSegment;

/// WGS84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Parse a `"lat,lng"` pair such as `"37.1234,-122.5678"`.
    ///
    /// Only plain decimal numbers are accepted on either side of the comma, so
    /// addresses containing a comma ("Main St, Springfield") are left for the
    /// geocoder. The range is not checked here, see [`Coordinate::is_valid`].
    pub fn parse_pair(input: &str) -> Option<Self> {
        let (lat, lng) = input.trim().split_once(',')?;
        let (lat, lng) = (lat.trim(), lng.trim());
        if !is_plain_decimal(lat) || !is_plain_decimal(lng) {
            return None;
        }
        Some(Self::new(lat.parse().ok()?, lng.parse().ok()?))
    }

    /// `"lat,lng"`, the inverse of [`Coordinate::parse_pair`].
    pub fn to_pair_string(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

fn is_plain_decimal(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };
    !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && fraction.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub low: Coordinate,
    pub high: Coordinate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelMode {
    #[default]
    Drive,
    Walk,
    Bicycle,
    Transit,
}

impl TravelMode {
    /// Accepts both the legacy directions names ("driving") and the Routes API
    /// names ("DRIVE"); anything unknown falls back to driving.
    pub fn from_request(mode: &str) -> Self {
        match mode.trim().to_ascii_lowercase().as_str() {
            "walking" | "walk" => TravelMode::Walk,
            "bicycling" | "bicycle" => TravelMode::Bicycle,
            "transit" => TravelMode::Transit,
            _ => TravelMode::Drive,
        }
    }

    pub fn as_provider_str(&self) -> &'static str {
        match self {
            TravelMode::Drive => "DRIVE",
            TravelMode::Walk => "WALK",
            TravelMode::Bicycle => "BICYCLE",
            TravelMode::Transit => "TRANSIT",
        }
    }

    pub fn as_display_str(&self) -> &'static str {
        match self {
            TravelMode::Drive => "drive",
            TravelMode::Walk => "walk",
            TravelMode::Bicycle => "bicycle",
            TravelMode::Transit => "transit",
        }
    }
}

/// One navigation step of a route leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub instruction: String,
    pub distance_meters: u64,
    pub duration_seconds: u64,
    pub distance: String,
    pub duration: String,
}

/// A computed single-leg route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub origin_coord: Coordinate,
    pub destination_coord: Coordinate,
    pub distance_meters: u64,
    pub duration_seconds: u64,
    /// Display form of `distance_meters`.
    pub distance: String,
    /// Display form of `duration_seconds`.
    pub duration: String,
    pub mode: String,
    pub encoded_polyline: String,
    pub steps: Vec<Step>,
    pub bounds: Option<BoundingBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leg {
    pub start: Coordinate,
    pub end: Coordinate,
    pub distance_meters: u64,
    pub duration_seconds: u64,
    pub distance: String,
    pub duration: String,
}

/// A route through intermediate waypoints, one leg per hop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaypointRoute {
    pub origin_coord: Coordinate,
    pub destination_coord: Coordinate,
    pub waypoints: Vec<String>,
    pub total_distance_meters: u64,
    pub total_duration_seconds: u64,
    pub distance: String,
    pub duration: String,
    pub mode: String,
    pub encoded_polyline: String,
    pub legs: Vec<Leg>,
}

/// A normalized point of interest found along a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    pub address: String,
    pub location: Option<Coordinate>,
    pub primary_type: String,
    pub rating: Option<f64>,
    pub user_rating_count: u32,
    pub is_open: bool,
    pub price_level: Option<u8>,
    pub detour_seconds: Option<f64>,
    pub detour_minutes: Option<f64>,
    pub detour_meters: Option<u64>,
    /// Display form of `detour_meters`.
    pub detour_distance: Option<String>,
    pub directions_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_index: Option<usize>,
}

/// A curated stop: the canonical place fields plus the ranking rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedPlace {
    pub id: String,
    pub name: String,
    pub address: String,
    pub location: Option<Coordinate>,
    pub primary_type: String,
    pub rating: Option<f64>,
    pub user_rating_count: u32,
    pub is_open: bool,
    pub price_level: Option<u8>,
    pub detour_minutes: Option<f64>,
    pub detour_km: Option<f64>,
    pub directions_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_index: Option<usize>,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopsSegment {
    pub label: String,
    pub recommended_places: Vec<RecommendedPlace>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopsPlan {
    pub segments: Vec<StopsSegment>,
}

impl StopsPlan {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn recommendation_count(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| segment.recommended_places.len())
            .sum()
    }
}

/// Segment provenance attached to a segment-scoped place search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentContext {
    pub index: usize,
    pub label: String,
    pub start_offset_seconds: u64,
    pub end_offset_seconds: u64,
    /// Total route duration; zero means unknown and the segment end is used.
    #[serde(default)]
    pub route_duration_seconds: u64,
}

impl SegmentContext {
    pub fn new(segment: &RouteSegment, route_duration_seconds: u64) -> Self {
        Self {
            index: segment.index,
            label: segment.label.clone(),
            start_offset_seconds: segment.start_offset_seconds,
            end_offset_seconds: segment.end_offset_seconds,
            route_duration_seconds,
        }
    }

    /// Fraction of the trip at the segment midpoint, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let total = if self.route_duration_seconds > 0 {
            self.route_duration_seconds
        } else {
            self.end_offset_seconds
        };
        if total == 0 {
            return 0.0;
        }
        let midpoint = self.start_offset_seconds as f64 / 2.0 + self.end_offset_seconds as f64 / 2.0;
        (midpoint / total as f64).clamp(0.0, 1.0)
    }
}

pub const DEFAULT_MAX_RESULT_COUNT: u32 = 20;

/// Parameters for one along-route place search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub text_query: String,
    pub encoded_polyline: String,
    pub max_result_count: u32,
    pub open_now: bool,
    pub included_type: Option<String>,
    /// Needed for detour summaries; without it detour fields stay unset.
    pub origin: Option<Coordinate>,
    pub segment: Option<SegmentContext>,
}

impl SearchParams {
    pub fn new(text_query: impl Into<String>, encoded_polyline: impl Into<String>) -> Self {
        Self {
            text_query: text_query.into(),
            encoded_polyline: encoded_polyline.into(),
            max_result_count: DEFAULT_MAX_RESULT_COUNT,
            open_now: false,
            included_type: None,
            origin: None,
            segment: None,
        }
    }

    pub fn with_origin(mut self, origin: Coordinate) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_segment(mut self, segment: SegmentContext) -> Self {
        self.segment = Some(segment);
        self
    }

    pub fn validate(&self) -> Result<(), TripError> {
        if self.text_query.trim().is_empty() {
            return Err(TripError::validation("textQuery is required"));
        }
        if self.encoded_polyline.trim().is_empty() {
            return Err(TripError::validation("encodedPolyline is required"));
        }
        if let Some(origin) = &self.origin {
            if !origin.is_valid() {
                return Err(TripError::validation("origin coordinates are out of range"));
            }
        }
        Ok(())
    }
}
