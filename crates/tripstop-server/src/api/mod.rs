//! HTTP surface of the tripstop server.

pub mod error;
pub mod request_id;
mod routes;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    routes::create_router()
}
