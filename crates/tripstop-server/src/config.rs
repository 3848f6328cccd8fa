//! Server configuration from environment.

use std::env;
use std::time::Duration;

use tripstop_core::DEFAULT_TARGET_SEGMENT_SECONDS;
use tripstop_google::{GeminiConfig, GoogleConfig};

pub const DEFAULT_SEGMENT_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_SEGMENTS: usize = 8;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub google_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub routes_url: Option<String>,
    pub places_url: Option<String>,
    pub geocode_url: Option<String>,
    pub gemini_url: Option<String>,
    pub upstream_timeout: Duration,
    pub segment_delay: Duration,
    pub segment_target_seconds: u64,
    pub max_segments: usize,
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            google_api_key: None,
            gemini_api_key: None,
            routes_url: None,
            places_url: None,
            geocode_url: None,
            gemini_url: None,
            upstream_timeout: tripstop_google::config::DEFAULT_TIMEOUT,
            segment_delay: DEFAULT_SEGMENT_DELAY,
            segment_target_seconds: DEFAULT_TARGET_SEGMENT_SECONDS,
            max_segments: DEFAULT_MAX_SEGMENTS,
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parsed("TRIPSTOP_PORT").unwrap_or(defaults.server_port),
            google_api_key: non_empty("GOOGLE_MAPS_API_KEY"),
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            routes_url: non_empty("TRIPSTOP_ROUTES_URL"),
            places_url: non_empty("TRIPSTOP_PLACES_URL"),
            geocode_url: non_empty("TRIPSTOP_GEOCODE_URL"),
            gemini_url: non_empty("TRIPSTOP_GEMINI_URL"),
            upstream_timeout: parsed("TRIPSTOP_UPSTREAM_TIMEOUT_S")
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.upstream_timeout),
            segment_delay: parsed("TRIPSTOP_SEGMENT_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.segment_delay),
            segment_target_seconds: parsed("TRIPSTOP_SEGMENT_TARGET_S")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.segment_target_seconds),
            max_segments: parsed("TRIPSTOP_MAX_SEGMENTS")
                .filter(|max| *max > 0)
                .unwrap_or(defaults.max_segments),
            log_json: env::var("TRIPSTOP_LOG_JSON")
                .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// Google settings, or `None` when no Maps key is configured.
    pub fn google(&self) -> Option<GoogleConfig> {
        let mut google = GoogleConfig::new(self.google_api_key.clone()?);
        google.timeout = self.upstream_timeout;
        if let Some(url) = &self.routes_url {
            google.routes_url = url.clone();
        }
        if let Some(url) = &self.places_url {
            google.places_url = url.clone();
        }
        if let Some(url) = &self.geocode_url {
            google.geocode_url = url.clone();
        }
        Some(google)
    }

    pub fn gemini(&self) -> GeminiConfig {
        let mut gemini = GeminiConfig::new(self.gemini_api_key.clone());
        gemini.timeout = self.upstream_timeout;
        if let Some(url) = &self.gemini_url {
            gemini.url = url.clone();
        }
        gemini
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}
