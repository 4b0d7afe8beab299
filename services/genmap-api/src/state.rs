//! Application state for the genmap service.

use std::sync::Arc;

use anyhow::{Context, Result};

use renderer::{HttpTileProvider, ImageFormat, MapOptions, MapStyle, TileProvider};
use storage::ObjectStorage;

use crate::config::GenMapConfig;

/// Shared application state.
pub struct AppState {
    /// Upload target for rendered maps.
    pub storage: ObjectStorage,

    /// Base map tiles.
    pub tiles: Arc<dyn TileProvider>,

    /// Overlay colors and widths.
    pub style: MapStyle,

    /// Canvas size and zoom.
    pub map_options: MapOptions,

    /// Output encoding.
    pub format: ImageFormat,
    pub webp_quality: f32,

    /// Public URL prefix of the bucket, without trailing slash.
    pub public_base_url: String,
}

impl AppState {
    /// Build the state from loaded configuration.
    pub fn from_config(config: &GenMapConfig) -> Result<Self> {
        let storage = ObjectStorage::new(&config.storage)
            .context("Failed to create object storage client")?;

        let tiles = HttpTileProvider::new(config.tiles.clone())
            .context("Failed to create tile client")?;

        let style = match &config.style_file {
            Some(path) => MapStyle::from_file(path)
                .map_err(|e| anyhow::anyhow!("Failed to load map style {}: {}", path, e))?,
            None => MapStyle::default(),
        };

        Ok(Self {
            storage,
            tiles: Arc::new(tiles),
            style,
            map_options: config.map,
            format: config.format,
            webp_quality: config.webp_quality,
            public_base_url: config.public_base_url.clone(),
        })
    }

    /// Assemble state from ready-made components with default rendering
    /// settings.
    pub fn new(
        storage: ObjectStorage,
        tiles: Arc<dyn TileProvider>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            tiles,
            style: MapStyle::default(),
            map_options: MapOptions::default(),
            format: ImageFormat::default(),
            webp_quality: renderer::encode::DEFAULT_WEBP_QUALITY,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}
