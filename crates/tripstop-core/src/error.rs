//! Error taxonomy shared by the clients and the request orchestrator.

use serde::Serialize;
use thiserror::Error;

/// A collaborator answered with a non-success status or an unusable body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("upstream returned {status}: {body}")]
pub struct UpstreamError {
    pub status: u16,
    pub body: String,
}

impl UpstreamError {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// The request never completed within the configured timeout.
    pub fn timeout(what: &str) -> Self {
        Self::new(504, format!("{what} timed out"))
    }

    /// Connection, TLS or decode failure before a usable status was seen.
    pub fn transport(what: &str, detail: impl std::fmt::Display) -> Self {
        Self::new(502, format!("{what} failed: {detail}"))
    }
}

/// Why one segment of a segmented search produced nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentFailure {
    pub segment_index: usize,
    pub label: String,
    pub error: UpstreamError,
}

#[derive(Debug, Error)]
pub enum TripError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("location not found: {0}")]
    Resolution(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("all {} route segments failed", .0.len())]
    AggregateUpstream(Vec<SegmentFailure>),
}

impl TripError {
    pub fn validation(message: impl Into<String>) -> Self {
        TripError::Validation(message.into())
    }

    /// Collapse into the status/body pair recorded for a failed segment.
    pub fn into_upstream(self) -> UpstreamError {
        let message = self.to_string();
        match self {
            TripError::Upstream(error) => error,
            TripError::Validation(_) => UpstreamError::new(400, message),
            TripError::Resolution(_) => UpstreamError::new(404, message),
            TripError::AggregateUpstream(_) => UpstreamError::new(502, message),
        }
    }
}
