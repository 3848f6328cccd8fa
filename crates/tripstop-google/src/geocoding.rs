//! Address → coordinate resolution with a Places fallback.

use anyhow::Result;
use reqwest::Client;
use serde::Deserialize;
use tripstop_core::{Coordinate, TripError};

use crate::config::GoogleConfig;
use crate::http::{build_client, read_json, send_error};
use crate::places::PlacesClient;

const STATUS_OK: &str = "OK";
const STATUS_REQUEST_DENIED: &str = "REQUEST_DENIED";

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: LatLngLiteral,
}

#[derive(Debug, Deserialize)]
struct LatLngLiteral {
    lat: f64,
    lng: f64,
}

/// Resolves route endpoints ("lat,lng" or free text) to coordinates.
#[derive(Clone)]
pub struct Geocoder {
    client: Client,
    url: String,
    api_key: String,
    places: PlacesClient,
}

enum GeocodeOutcome {
    Found(Coordinate),
    Denied(String),
}

impl Geocoder {
    pub fn new(config: &GoogleConfig) -> Result<Self> {
        Ok(Self::with_client(build_client(config.timeout)?, config))
    }

    pub(crate) fn with_client(client: Client, config: &GoogleConfig) -> Self {
        Self {
            places: PlacesClient::with_client(client.clone(), config),
            client,
            url: config.geocode_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Resolve one endpoint. Numeric pairs are used as-is (after a range
    /// check); anything else is geocoded.
    pub async fn resolve(&self, input: &str) -> Result<Coordinate, TripError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TripError::validation("route endpoint is empty"));
        }

        if let Some(coordinate) = Coordinate::parse_pair(input) {
            if !coordinate.is_valid() {
                return Err(TripError::validation(format!(
                    "coordinates out of range: {input}"
                )));
            }
            return Ok(coordinate);
        }

        self.geocode(input).await
    }

    /// Geocode a free-text address.
    ///
    /// Falls back to a Places text search only when the geocoder refuses the
    /// request (API not enabled for the key). Any other miss is final.
    pub async fn geocode(&self, address: &str) -> Result<Coordinate, TripError> {
        tracing::debug!("Geocoding address: {}", address);

        let reason = match self.geocode_primary(address).await? {
            GeocodeOutcome::Found(coordinate) => return Ok(coordinate),
            GeocodeOutcome::Denied(reason) => reason,
        };

        tracing::info!("Geocoding denied ({}), trying Places fallback", reason);
        match self.places.locate(address).await {
            Ok(Some(coordinate)) if coordinate.is_valid() => {
                tracing::debug!(
                    "Places fallback resolved {} to {},{}",
                    address,
                    coordinate.latitude,
                    coordinate.longitude
                );
                Ok(coordinate)
            }
            Ok(_) => Err(TripError::Resolution(format!(
                "{address}: geocoding denied and no place matched"
            ))),
            Err(err) => Err(TripError::Resolution(format!(
                "{address}: geocoding denied and place lookup failed ({err})"
            ))),
        }
    }

    async fn geocode_primary(&self, address: &str) -> Result<GeocodeOutcome, TripError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|err| send_error("geocoding", err))?;

        if response.status() == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Ok(GeocodeOutcome::Denied(format!("HTTP 403 {body}")));
        }

        let payload: GeocodeResponse = read_json("geocoding", response).await?;
        if payload.status == STATUS_REQUEST_DENIED {
            return Ok(GeocodeOutcome::Denied(
                payload.error_message.unwrap_or(payload.status),
            ));
        }

        if payload.status == STATUS_OK {
            if let Some(result) = payload.results.first() {
                let location = &result.geometry.location;
                let coordinate = Coordinate::new(location.lat, location.lng);
                if coordinate.is_valid() {
                    return Ok(GeocodeOutcome::Found(coordinate));
                }
            }
        }

        let detail = payload
            .error_message
            .map(|message| format!("{} - {}", payload.status, message))
            .unwrap_or(payload.status);
        tracing::warn!("Geocoding failed for {}: {}", address, detail);
        Err(TripError::Resolution(format!("{address}: {detail}")))
    }
}
