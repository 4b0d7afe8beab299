//! End-to-end tests of the HTTP router with offline tiles and in-memory
//! object storage.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use image::RgbaImage;
use object_store::memory::InMemory;
use object_store::throttle::{ThrottleConfig, ThrottledStore};
use tower::ServiceExt;

use genmap_api::build_router;
use genmap_api::state::AppState;
use genmap_common::{GenMapError, GenMapResult};
use renderer::{ImageFormat, SolidTileProvider, TileCoord, TileProvider};
use storage::ObjectStorage;

const PUBLIC_BASE_URL: &str = "https://maps.example.com/";

struct FailingTiles;

#[async_trait]
impl TileProvider for FailingTiles {
    async fn fetch(&self, coord: TileCoord) -> GenMapResult<RgbaImage> {
        Err(GenMapError::TileFetch(format!(
            "{}/{}/{}: connection refused",
            coord.z, coord.x, coord.y
        )))
    }
}

fn test_state(tiles: Arc<dyn TileProvider>) -> Arc<AppState> {
    let storage =
        ObjectStorage::with_store(Arc::new(InMemory::new()), "test", Duration::from_secs(5));
    Arc::new(AppState::new(storage, tiles, PUBLIC_BASE_URL))
}

fn solid_state() -> Arc<AppState> {
    test_state(Arc::new(SolidTileProvider::new([220, 220, 220, 255])))
}

fn post_genmap(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/genmap")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

// ============================================================================
// Success path
// ============================================================================

#[tokio::test]
async fn test_genmap_uploads_and_returns_url() {
    let state = solid_state();
    let app = build_router(Arc::clone(&state), None);

    let (status, json) = send(
        app,
        post_genmap(
            r#"{"typhoonNumber": "2410", "validtime": "2024-08-29T09:00:00+09:00", "center": [31.2, 130.5]}"#,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        json["url"],
        "https://maps.example.com/2410/202408290900.webp"
    );

    let stored = state.storage.get("2410/202408290900.webp").await.unwrap();
    assert_eq!(&stored[0..4], b"RIFF");
    assert_eq!(&stored[8..12], b"WEBP");
}

#[tokio::test]
async fn test_genmap_with_track_and_warning_areas() {
    let state = solid_state();
    let app = build_router(Arc::clone(&state), None);

    let body = r#"{
        "typhoonNumber": "2410",
        "validtime": "2024-08-29T00:00:00Z",
        "center": [31.2, 130.5],
        "track": {
            "preTyphoon": [[18.0, 142.0], [20.1, 140.3]],
            "typhoon": [[24.0, 136.0], [28.9, 132.1], [31.2, 130.5]]
        },
        "stormWarningArea": {"center": [31.2, 130.5], "radius": 190000},
        "galeWarningArea": {"arc": [[31.0, 130.6], 500000, [0, 270]]}
    }"#;
    let (status, json) = send(app, post_genmap(body)).await;

    assert_eq!(status, StatusCode::OK, "body = {}", json);
    assert_eq!(
        json["url"],
        "https://maps.example.com/2410/202408290000.webp"
    );
}

#[tokio::test]
async fn test_genmap_accepts_legacy_latlng() {
    let app = build_router(solid_state(), None);
    let (status, _) = send(
        app,
        post_genmap(r#"{"typhoonNumber": "2401", "validtime": "2024-01-01T00:00:00Z", "latLng": [10.0, 150.0]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_genmap_png_output() {
    let storage =
        ObjectStorage::with_store(Arc::new(InMemory::new()), "test", Duration::from_secs(5));
    let mut state = AppState::new(
        storage,
        Arc::new(SolidTileProvider::new([220, 220, 220, 255])),
        PUBLIC_BASE_URL,
    );
    state.format = ImageFormat::Png;
    let state = Arc::new(state);

    let (status, json) = send(
        build_router(Arc::clone(&state), None),
        post_genmap(r#"{"typhoonNumber": "2401", "validtime": "2024-01-01T00:00:00Z", "center": [10.0, 150.0]}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["url"], "https://maps.example.com/2401/202401010000.png");

    let stored = state.storage.get("2401/202401010000.png").await.unwrap();
    let decoded = image::load_from_memory(&stored).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (600, 450));
}

// ============================================================================
// Client errors
// ============================================================================

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = build_router(solid_state(), None);
    let (status, json) = send(app, post_genmap("{\"typhoonNumber\": ")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("malformed"));
}

#[tokio::test]
async fn test_short_center_is_bad_request() {
    let state = solid_state();
    let app = build_router(Arc::clone(&state), None);
    let (status, _) = send(
        app,
        post_genmap(r#"{"typhoonNumber": "2410", "validtime": "2024-08-29T09:00:00+09:00", "center": [31.2]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(state.storage.get("2410/202408290900.webp").await.is_err());
}

#[tokio::test]
async fn test_long_center_is_bad_request() {
    let app = build_router(solid_state(), None);
    let (status, _) = send(
        app,
        post_genmap(r#"{"typhoonNumber": "2410", "validtime": "2024-08-29T09:00:00+09:00", "center": [31.2, 130.5, 0.0]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_validtime_is_bad_request() {
    let app = build_router(solid_state(), None);
    let (status, _) = send(
        app,
        post_genmap(r#"{"typhoonNumber": "2410", "center": [31.2, 130.5]}"#),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_genmap_not_allowed() {
    let app = build_router(solid_state(), None);
    let request = Request::builder()
        .uri("/genmap")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

// ============================================================================
// Server errors
// ============================================================================

#[tokio::test]
async fn test_tile_failure_is_server_error() {
    let state = test_state(Arc::new(FailingTiles));
    let app = build_router(Arc::clone(&state), None);

    let (status, json) = send(
        app,
        post_genmap(r#"{"typhoonNumber": "2410", "validtime": "2024-08-29T09:00:00+09:00", "center": [31.2, 130.5]}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("tile"));
    assert!(state.storage.get("2410/202408290900.webp").await.is_err());
}

#[tokio::test]
async fn test_upload_timeout_is_server_error() {
    let slow = ThrottledStore::new(
        InMemory::new(),
        ThrottleConfig {
            wait_put_per_call: Duration::from_millis(500),
            ..Default::default()
        },
    );
    let storage = ObjectStorage::with_store(Arc::new(slow), "test", Duration::from_millis(50));
    let state = Arc::new(AppState::new(
        storage,
        Arc::new(SolidTileProvider::new([220, 220, 220, 255])),
        PUBLIC_BASE_URL,
    ));

    let (status, json) = send(
        build_router(Arc::clone(&state), None),
        post_genmap(r#"{"typhoonNumber": "2410", "validtime": "2024-08-29T09:00:00+09:00", "center": [31.2, 130.5]}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("timed out"));
    assert!(json.get("url").is_none());
    assert!(state.storage.get("2410/202408290900.webp").await.is_err());
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = build_router(solid_state(), None);
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "genmap");
}

#[tokio::test]
async fn test_metrics_not_mounted_without_recorder() {
    let app = build_router(solid_state(), None);
    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
