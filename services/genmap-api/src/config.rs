//! Service configuration from environment variables.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use renderer::{ImageFormat, MapOptions, TileSourceConfig};
use storage::ObjectStorageConfig;

/// Runtime configuration of the genmap service.
#[derive(Debug, Clone)]
pub struct GenMapConfig {
    /// Upload target
    pub storage: ObjectStorageConfig,
    /// Public URL the bucket is served from
    pub public_base_url: String,
    /// Base map tile server
    pub tiles: TileSourceConfig,
    /// Canvas size and zoom
    pub map: MapOptions,
    /// Encoded output format
    pub format: ImageFormat,
    /// WebP quality (0-100)
    pub webp_quality: f32,
    /// Optional JSON file overriding the default overlay style
    pub style_file: Option<String>,
}

impl GenMapConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| var(key).ok_or_else(|| anyhow!("{} must be set", key));

        let endpoint = match (var("S3_ENDPOINT"), var("CF_ACCOUNT_ID")) {
            (Some(endpoint), _) => endpoint,
            (None, Some(account_id)) => ObjectStorageConfig::r2_endpoint(&account_id),
            (None, None) => return Err(anyhow!("either S3_ENDPOINT or CF_ACCOUNT_ID must be set")),
        };

        let storage = ObjectStorageConfig {
            allow_http: endpoint.starts_with("http://"),
            endpoint,
            bucket: required("R2_BUCKET_NAME")?,
            access_key_id: required("AWS_ACCESS_KEY_ID")?,
            secret_access_key: required("AWS_SECRET_ACCESS_KEY")?,
            region: var("AWS_REGION").unwrap_or_else(|| "auto".to_string()),
            upload_timeout: Duration::from_secs(parse_or(&var, "UPLOAD_TIMEOUT_SECS", 30u64)?),
        };

        let public_base_url = required("R2_BUCKET_PUBLIC_BASE_URL")?
            .trim_end_matches('/')
            .to_string();

        let default_tiles = TileSourceConfig::default();
        let tiles = TileSourceConfig {
            url_template: var("TILE_URL_TEMPLATE").unwrap_or(default_tiles.url_template),
            subdomains: var("TILE_SUBDOMAINS")
                .map(|s| s.split(',').map(|d| d.trim().to_string()).collect())
                .unwrap_or(default_tiles.subdomains),
            user_agent: var("TILE_USER_AGENT").unwrap_or(default_tiles.user_agent),
            request_timeout: Duration::from_secs(parse_or(
                &var,
                "TILE_TIMEOUT_SECS",
                default_tiles.request_timeout.as_secs(),
            )?),
        };

        let default_map = MapOptions::default();
        let map = MapOptions {
            width: parse_or(&var, "MAP_WIDTH", default_map.width)?,
            height: parse_or(&var, "MAP_HEIGHT", default_map.height)?,
            zoom: parse_or(&var, "MAP_ZOOM", default_map.zoom)?,
        };
        map.validate().context("invalid MAP_* settings")?;

        let format = match var("MAP_FORMAT").as_deref() {
            None | Some("webp") => ImageFormat::Webp,
            Some("png") => ImageFormat::Png,
            Some(other) => return Err(anyhow!("MAP_FORMAT '{}' is not webp or png", other)),
        };

        let webp_quality: f32 =
            parse_or(&var, "WEBP_QUALITY", renderer::encode::DEFAULT_WEBP_QUALITY)?;
        if !(0.0..=100.0).contains(&webp_quality) {
            return Err(anyhow!("WEBP_QUALITY {} outside 0-100", webp_quality));
        }

        Ok(Self {
            storage,
            public_base_url,
            tiles,
            map,
            format,
            webp_quality,
            style_file: var("MAP_STYLE_FILE"),
        })
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value '{}' for {}", raw, key)),
        None => Ok(default),
    }
}
