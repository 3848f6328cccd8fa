//! Duration and distance conversions for provider payloads.
//!
//! The Routes and Places APIs encode durations as protobuf-style strings
//! (`"390s"`), but test doubles and older endpoints send bare numbers. Both
//! shapes deserialize into [`DurationValue`].

use serde::{Deserialize, Serialize};

/// A provider duration: either plain seconds or a `"<n>s"` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(f64),
    Text(String),
}

impl DurationValue {
    /// Seconds as a float, or `None` when the value is not a finite,
    /// non-negative number.
    pub fn seconds(&self) -> Option<f64> {
        let value = match self {
            DurationValue::Seconds(value) => *value,
            DurationValue::Text(text) => {
                let trimmed = text.trim();
                let digits = trimmed.strip_suffix('s').unwrap_or(trimmed);
                digits.trim().parse::<f64>().ok()?
            }
        };
        if value.is_finite() && value >= 0.0 {
            Some(value)
        } else {
            None
        }
    }
}

impl From<u64> for DurationValue {
    fn from(value: u64) -> Self {
        DurationValue::Seconds(value as f64)
    }
}

impl From<f64> for DurationValue {
    fn from(value: f64) -> Self {
        DurationValue::Seconds(value)
    }
}

impl From<&str> for DurationValue {
    fn from(value: &str) -> Self {
        DurationValue::Text(value.to_string())
    }
}

/// Convert a provider duration to minutes rounded to one decimal place.
pub fn convert_seconds_to_minutes(value: Option<&DurationValue>) -> Option<f64> {
    let seconds = value?.seconds()?;
    Some(round_one_decimal(seconds / 60.0))
}

/// Whole seconds of a provider duration (fractional seconds are truncated).
pub fn parse_duration_seconds(value: &DurationValue) -> Option<u64> {
    value.seconds().map(|seconds| seconds.trunc() as u64)
}

/// `"80.0 km"`; zero renders as `"0 km"`.
pub fn format_distance(meters: u64) -> String {
    if meters == 0 {
        return "0 km".to_string();
    }
    format!("{:.1} km", meters as f64 / 1000.0)
}

/// `"90 mins"`, rounded to the nearest minute; zero renders as `"0 mins"`.
pub fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "0 mins".to_string();
    }
    format!("{} mins", (seconds as f64 / 60.0).round() as u64)
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
