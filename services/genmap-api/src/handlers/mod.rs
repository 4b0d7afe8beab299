//! HTTP request handlers for the genmap API.

pub mod genmap;
pub mod health;

use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;

use genmap_common::GenMapError;

use crate::state::AppState;

/// Error body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps a [`GenMapError`] onto an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub GenMapError);

impl From<GenMapError> for ApiError {
    fn from(err: GenMapError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the HTTP router. `/metrics` is only mounted when a Prometheus
/// recorder is installed.
pub fn build_router(state: Arc<AppState>, metrics: Option<PrometheusHandle>) -> Router {
    let mut router = Router::new()
        .route("/genmap", post(genmap::genmap_handler))
        .route("/health", get(health::health_handler));

    if let Some(handle) = metrics {
        router = router
            .route("/metrics", get(health::metrics_handler))
            .layer(Extension(handle));
    }

    router.layer(Extension(state))
}
