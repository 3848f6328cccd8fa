//! HTTP client for the tripstop server API.

use anyhow::{bail, Context, Result};
use reqwest::blocking::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tripstop_core::{Coordinate, Place, Route, StopsPlan, WaypointRoute};

/// Segmented searches plus curation can take a while on long trips.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// The parts of a place search response the CLI reports on.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopsSummary {
    pub query: String,
    pub total_results: usize,
    #[serde(default)]
    pub places: Vec<Place>,
    pub intelligent_stops: Option<StopsPlan>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopsQuery<'a> {
    pub text_query: &'a str,
    pub encoded_polyline: &'a str,
    pub origin: Coordinate,
    pub route_duration_seconds: u64,
    pub open_now: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_result_count: Option<u32>,
}

/// Blocking client for one tripstop server.
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. "http://localhost:3000").
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn plan_route(&self, origin: &str, destination: &str, mode: &str) -> Result<Route> {
        self.post(
            "/api/route",
            &json!({ "origin": origin, "destination": destination, "mode": mode }),
        )
    }

    pub fn plan_route_with_waypoints(
        &self,
        origin: &str,
        destination: &str,
        waypoints: &[String],
        mode: &str,
    ) -> Result<WaypointRoute> {
        self.post(
            "/api/route/waypoints",
            &json!({
                "origin": origin,
                "destination": destination,
                "waypoints": waypoints,
                "mode": mode,
            }),
        )
    }

    pub fn search_stops(&self, query: &StopsQuery<'_>) -> Result<StopsSummary> {
        self.post("/api/places/search", query)
    }

    fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .with_context(|| format!("Failed to reach {}", url))?;
        decode(response)
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body: Value = response.json().unwrap_or(Value::Null);
        bail!("{}", error_message(status.as_u16(), &body));
    }
    response.json().context("Failed to decode server response")
}

/// One-line description of an error response body.
pub fn error_message(status: u16, body: &Value) -> String {
    let error = body["error"].as_str().unwrap_or("request failed");
    match &body["details"] {
        Value::Null => format!("server returned {}: {}", status, error),
        Value::String(details) => format!("server returned {}: {} ({})", status, error, details),
        details => format!("server returned {}: {} ({})", status, error, details),
    }
}
