//! Shared, read-only application state.
//!
//! Requests are independent: the state only holds configured provider
//! clients, so no locking is needed.

use anyhow::{Context, Result};
use tripstop_google::{GeminiClient, PlacesClient, RoutesClient};

use crate::config::Config;
use crate::stop_planner::{SegmentSettings, StopPlanner};

pub struct AppState {
    pub routes: RoutesClient,
    pub stops: StopPlanner<PlacesClient, GeminiClient>,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let google = config
            .google()
            .context("GOOGLE_MAPS_API_KEY environment variable is required")?;
        let routes = RoutesClient::new(&google)?;
        let places = PlacesClient::new(&google)?;
        let gemini = GeminiClient::from_config(&config.gemini())?;
        if gemini.is_none() {
            tracing::warn!("GEMINI_API_KEY not set; intelligent stop selection disabled");
        }

        Ok(Self {
            routes,
            stops: StopPlanner::new(places, gemini, SegmentSettings::from(&config)),
            config,
        })
    }
}
