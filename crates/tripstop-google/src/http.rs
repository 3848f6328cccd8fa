//! Shared request plumbing: client construction and error mapping.

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tripstop_core::UpstreamError;

pub(crate) const API_KEY_HEADER: &str = "X-Goog-Api-Key";
pub(crate) const FIELD_MASK_HEADER: &str = "X-Goog-FieldMask";

pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

pub(crate) fn send_error(what: &str, err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::timeout(what)
    } else {
        UpstreamError::transport(what, err)
    }
}

/// Decode a success body, or surface the provider's status and body verbatim.
pub(crate) async fn read_json<T: DeserializeOwned>(
    what: &str,
    response: Response,
) -> Result<T, UpstreamError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("{} returned {}: {}", what, status, body);
        return Err(UpstreamError::new(status.as_u16(), body));
    }

    let bytes = response.bytes().await.map_err(|err| send_error(what, err))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| UpstreamError::new(502, format!("{what} returned malformed JSON: {err}")))
}
