//! Slippy-map tile sources.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgba, RgbaImage};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use genmap_common::{GenMapError, GenMapResult};

use crate::mercator::TILE_SIZE;

/// A tile coordinate (z/x/y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u8,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Number of tiles along one axis at this zoom.
    pub fn matrix_size(z: u8) -> u32 {
        1u32 << z
    }
}

/// Source of map tiles.
#[async_trait]
pub trait TileProvider: Send + Sync {
    /// Fetch and decode one tile.
    async fn fetch(&self, coord: TileCoord) -> GenMapResult<RgbaImage>;
}

/// Configuration for an HTTP tile server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileSourceConfig {
    /// URL with `{z}`, `{x}`, `{y}` and optionally `{s}` placeholders
    pub url_template: String,
    /// Values substituted for `{s}`
    pub subdomains: Vec<String>,
    /// User-Agent sent with each request (OSM requires an identifying one)
    pub user_agent: String,
    /// Per-tile request timeout
    pub request_timeout: Duration,
}

impl Default for TileSourceConfig {
    fn default() -> Self {
        Self {
            url_template: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            subdomains: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            user_agent: format!("genmap/{}", env!("CARGO_PKG_VERSION")),
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// Fetches tiles from a slippy-map HTTP server.
pub struct HttpTileProvider {
    client: Client,
    config: TileSourceConfig,
}

impl HttpTileProvider {
    pub fn new(config: TileSourceConfig) -> GenMapResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|e| GenMapError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Expand the URL template for a tile.
    pub fn tile_url(&self, coord: TileCoord) -> String {
        let mut url = self
            .config
            .url_template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string());

        if !self.config.subdomains.is_empty() {
            let idx = (coord.x as usize + coord.y as usize) % self.config.subdomains.len();
            url = url.replace("{s}", &self.config.subdomains[idx]);
        }
        url
    }
}

#[async_trait]
impl TileProvider for HttpTileProvider {
    #[instrument(skip(self), fields(z = coord.z, x = coord.x, y = coord.y))]
    async fn fetch(&self, coord: TileCoord) -> GenMapResult<RgbaImage> {
        let url = self.tile_url(coord);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| GenMapError::TileFetch(format!("{}: {}", url, e)))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| GenMapError::TileFetch(format!("{}: {}", url, e)))?;

        debug!(size = body.len(), "Fetched tile");

        let tile = image::load_from_memory(&body)
            .map_err(|e| GenMapError::TileFetch(format!("{}: undecodable tile: {}", url, e)))?;

        Ok(tile.to_rgba8())
    }
}

/// Serves tiles of a single color. Used offline and in tests.
pub struct SolidTileProvider {
    color: Rgba<u8>,
    fetched: AtomicUsize,
}

impl SolidTileProvider {
    pub fn new(color: [u8; 4]) -> Self {
        Self {
            color: Rgba(color),
            fetched: AtomicUsize::new(0),
        }
    }

    /// Number of tiles served so far.
    pub fn fetched(&self) -> usize {
        self.fetched.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl TileProvider for SolidTileProvider {
    async fn fetch(&self, coord: TileCoord) -> GenMapResult<RgbaImage> {
        if coord.x >= TileCoord::matrix_size(coord.z) || coord.y >= TileCoord::matrix_size(coord.z)
        {
            return Err(GenMapError::TileFetch(format!(
                "tile {}/{}/{} out of range",
                coord.z, coord.x, coord.y
            )));
        }
        self.fetched.fetch_add(1, Ordering::Relaxed);
        Ok(RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, self.color))
    }
}
