//! `POST /genmap`: render, encode and upload a typhoon position map.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, info_span, Instrument, Span};
use uuid::Uuid;

use genmap_common::{public_url, GenMapError, GenMapRequest, GenMapResponse, GenMapResult};
use renderer::{encode_image, StaticMap};

use super::ApiError;
use crate::state::AppState;

/// POST /genmap
///
/// The body is decoded by hand so malformed JSON maps to 400 rather than
/// axum's 415/422 rejections.
pub async fn genmap_handler(Extension(state): Extension<Arc<AppState>>, body: Bytes) -> Response {
    let span = info_span!(
        "genmap",
        request_id = %Uuid::new_v4(),
        typhoon = tracing::field::Empty,
    );

    async move {
        let started = Instant::now();

        match generate(&state, &body).await {
            Ok(response) => {
                metrics::counter!("genmap_requests_total", "status" => "ok").increment(1);
                info!(
                    url = %response.url,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Map published"
                );
                (StatusCode::OK, Json(response)).into_response()
            }
            Err(e) => {
                metrics::counter!("genmap_requests_total", "status" => e.kind()).increment(1);
                error!(error = %e, kind = e.kind(), "Map generation failed");
                ApiError(e).into_response()
            }
        }
    }
    .instrument(span)
    .await
}

async fn generate(state: &AppState, body: &[u8]) -> GenMapResult<GenMapResponse> {
    let req = GenMapRequest::from_json(body)?;
    Span::current().record("typhoon", req.typhoon_number.as_str());
    info!(
        validtime = %req.validtime,
        center = ?req.center,
        has_track = req.track.is_some(),
        warning_areas = req.warning_areas().count(),
        "Received genmap request"
    );

    info!("Generating map image");
    let render_started = Instant::now();
    let map = StaticMap::for_request(&req, state.map_options, &state.style);
    let viewport = map.viewport()?;
    let tiles = map.fetch_tiles(&viewport, state.tiles.as_ref()).await?;

    let format = state.format;
    let quality = state.webp_quality;
    let encoded = tokio::task::spawn_blocking(move || {
        let img = map.compose(&viewport, tiles)?;
        encode_image(&img, format, quality)
    })
    .await
    .map_err(|e| GenMapError::Internal(format!("render task failed: {}", e)))??;
    metrics::histogram!("genmap_render_seconds").record(render_started.elapsed().as_secs_f64());

    let key = req.object_key(format.extension());
    info!(key = %key, size = encoded.len(), "Uploading map image");
    let upload_started = Instant::now();
    state.storage.put(&key, Bytes::from(encoded)).await?;
    metrics::histogram!("genmap_upload_seconds").record(upload_started.elapsed().as_secs_f64());

    Ok(GenMapResponse {
        url: public_url(&state.public_base_url, &key),
    })
}
