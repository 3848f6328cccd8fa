//! tripstop-google - upstream provider clients
//!
//! Handles all communication with the Google Routes, Geocoding and Places
//! APIs and with the Gemini generative-text API. Each client normalizes its
//! provider's response into the `tripstop-core` models at the boundary.

pub mod config;
pub mod gemini;
pub mod geocoding;
mod http;
pub mod places;
pub mod routes;

pub use config::{GeminiConfig, GoogleConfig};
pub use gemini::GeminiClient;
pub use geocoding::Geocoder;
pub use places::{PlaceSearchResult, PlacesClient};
pub use routes::RoutesClient;
