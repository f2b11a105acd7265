//! Operational HTTP endpoints.
//!
//! - `/healthz` : liveness, with the number of declared instruments
//! - `/metrics` : Prometheus text format (path is configurable)

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use irismon_core::registry::TEXT_CONTENT_TYPE;

use crate::app_state::AppState;

pub async fn healthz(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "instruments": state.registry().len(),
        })),
    )
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.registry().snapshot().encode_text();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
        body,
    )
        .into_response()
}
