//! Axum router wiring.
//!
//! Exposes the scrape path and `/healthz`. Everything else falls through to
//! axum's 404. No request tracing layer is installed, so scrapes are not
//! access-logged.

use axum::{routing::get, Router};

use crate::{app_state::AppState, ops};

pub fn build_router(state: AppState) -> Router {
    let metrics_path = state.cfg().exporter.metrics_path.clone();
    Router::new()
        .route(&metrics_path, get(ops::metrics))
        .route("/healthz", get(ops::healthz))
        .with_state(state)
}
