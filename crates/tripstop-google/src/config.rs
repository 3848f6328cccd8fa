//! Explicit provider configuration, passed to each client constructor.

use std::time::Duration;
use tripstop_core::{BoundingBox, Coordinate};

pub const DEFAULT_ROUTES_URL: &str = "https://routes.googleapis.com/directions/v2:computeRoutes";
pub const DEFAULT_PLACES_URL: &str = "https://places.googleapis.com/v1/places:searchText";
pub const DEFAULT_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
pub const DEFAULT_GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Region swept by the segment location bias (see `places`). The bias is a
/// coarse diversity nudge, not real route geometry.
pub const DEFAULT_BIAS_REGION: BoundingBox = BoundingBox {
    low: Coordinate {
        latitude: 37.4219,
        longitude: -122.0841,
    },
    high: Coordinate {
        latitude: 37.9219,
        longitude: -121.7841,
    },
};

/// Google Maps Platform settings shared by the routes, geocoding and places
/// clients.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub api_key: String,
    pub routes_url: String,
    pub places_url: String,
    pub geocode_url: String,
    pub timeout: Duration,
    pub bias_region: BoundingBox,
    pub bias_radius_m: f64,
}

impl GoogleConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            routes_url: DEFAULT_ROUTES_URL.to_string(),
            places_url: DEFAULT_PLACES_URL.to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            bias_region: DEFAULT_BIAS_REGION,
            bias_radius_m: 50_000.0,
        }
    }

    /// Point every endpoint at one base URL (test doubles, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        self.routes_url = format!("{base_url}/directions/v2:computeRoutes");
        self.places_url = format!("{base_url}/v1/places:searchText");
        self.geocode_url = format!("{base_url}/maps/api/geocode/json");
        self
    }
}

/// Gemini settings. Without an API key curation is disabled.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key
                .map(|key| key.trim().to_string())
                .filter(|key| !key.is_empty()),
            url: DEFAULT_GEMINI_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}
