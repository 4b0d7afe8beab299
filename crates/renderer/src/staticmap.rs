//! Static map composition: tiles first, then vector overlays.

use futures::stream::{self, StreamExt, TryStreamExt};
use image::{imageops, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tiny_skia::{IntSize, Pixmap};
use tracing::debug;

use genmap_common::{GenMapError, GenMapRequest, GenMapResult, LatLng, WarningArea};

use crate::mercator::{lat_lng_to_world_px, unwrap_lng, TILE_SIZE};
use crate::overlay::MapObject;
use crate::style::{AreaStyle, MapStyle};
use crate::tiles::{TileCoord, TileProvider};

/// Largest canvas edge accepted, in pixels.
pub const MAX_DIMENSION: u32 = 4096;

/// Highest zoom level supported by common tile servers.
pub const MAX_ZOOM: u8 = 19;

/// Tile requests in flight at once for a single map.
pub const MAX_CONCURRENT_TILE_FETCHES: usize = 8;

/// Canvas size and zoom of a rendered map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapOptions {
    pub width: u32,
    pub height: u32,
    pub zoom: u8,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            width: 600,
            height: 450,
            zoom: 6,
        }
    }
}

impl MapOptions {
    pub fn validate(&self) -> GenMapResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(GenMapError::Render(format!(
                "map size {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(GenMapError::Render(format!(
                "map size {}x{} exceeds {} px",
                self.width, self.height, MAX_DIMENSION
            )));
        }
        if self.zoom > MAX_ZOOM {
            return Err(GenMapError::Render(format!(
                "zoom {} exceeds {}",
                self.zoom, MAX_ZOOM
            )));
        }
        Ok(())
    }
}

/// The window of world pixels covered by the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
    pub center: LatLng,
    /// World pixel of the canvas' top-left corner.
    pub origin_x: i64,
    pub origin_y: i64,
}

/// Where a tile lands on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlacement {
    pub coord: TileCoord,
    pub dest_x: i64,
    pub dest_y: i64,
}

impl Viewport {
    pub fn new(center: LatLng, options: &MapOptions) -> Self {
        let (cx, cy) = lat_lng_to_world_px(center.lat, center.lng, options.zoom);
        Self {
            zoom: options.zoom,
            width: options.width,
            height: options.height,
            center,
            origin_x: (cx - options.width as f64 / 2.0).round() as i64,
            origin_y: (cy - options.height as f64 / 2.0).round() as i64,
        }
    }

    /// Canvas pixel of a position. Longitudes are unwrapped around the
    /// center so nothing jumps across the antimeridian.
    pub fn project(&self, pos: &LatLng) -> (f32, f32) {
        let lng = unwrap_lng(pos.lng, self.center.lng);
        let (x, y) = lat_lng_to_world_px(pos.lat, lng, self.zoom);
        ((x - self.origin_x as f64) as f32, (y - self.origin_y as f64) as f32)
    }

    /// Tiles covering the canvas. Columns wrap around the world; rows past
    /// the poles are skipped.
    pub fn tile_placements(&self) -> Vec<TilePlacement> {
        let tile = TILE_SIZE as i64;
        let n = TileCoord::matrix_size(self.zoom) as i64;

        let min_tx = self.origin_x.div_euclid(tile);
        let max_tx = (self.origin_x + self.width as i64 - 1).div_euclid(tile);
        let min_ty = self.origin_y.div_euclid(tile);
        let max_ty = (self.origin_y + self.height as i64 - 1).div_euclid(tile);

        let mut placements = Vec::new();
        for ty in min_ty.max(0)..=max_ty.min(n - 1) {
            for tx in min_tx..=max_tx {
                placements.push(TilePlacement {
                    coord: TileCoord::new(self.zoom, tx.rem_euclid(n) as u32, ty as u32),
                    dest_x: tx * tile - self.origin_x,
                    dest_y: ty * tile - self.origin_y,
                });
            }
        }
        placements
    }
}

/// A static map: canvas options, a center and overlay objects.
#[derive(Debug, Clone)]
pub struct StaticMap {
    options: MapOptions,
    center: Option<LatLng>,
    background: Rgba<u8>,
    objects: Vec<MapObject>,
}

impl StaticMap {
    pub fn new(options: MapOptions) -> Self {
        Self {
            options,
            center: None,
            background: Rgba([170, 211, 223, 255]),
            objects: Vec::new(),
        }
    }

    pub fn with_center(mut self, center: LatLng) -> Self {
        self.center = Some(center);
        self
    }

    /// Set the color shown where no tile is drawn. Alpha is forced opaque.
    pub fn with_background(mut self, color: [u8; 4]) -> Self {
        self.background = Rgba([color[0], color[1], color[2], 255]);
        self
    }

    pub fn add_object(&mut self, object: MapObject) {
        self.objects.push(object);
    }

    pub fn objects(&self) -> &[MapObject] {
        &self.objects
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    /// Build the map for a typhoon position: warning areas, track, then the
    /// center marker on top.
    pub fn for_request(req: &GenMapRequest, options: MapOptions, style: &MapStyle) -> Self {
        let mut map = Self::new(options)
            .with_center(req.center)
            .with_background(style.background.0);

        if let Some(area) = &req.gale_warning_area {
            map.add_object(area_object(area, &style.gale_area));
        }
        if let Some(area) = &req.storm_warning_area {
            map.add_object(area_object(area, &style.storm_area));
        }

        if let Some(track) = &req.track {
            if track.pre_typhoon.len() >= 2 {
                map.add_object(MapObject::Path {
                    points: track.pre_typhoon.clone(),
                    style: style.pre_typhoon_track.clone(),
                });
            }

            // Start the typhoon segment where the pre-typhoon one ended.
            let mut points: Vec<LatLng> = track.pre_typhoon.last().copied().into_iter().collect();
            points.extend(track.typhoon.iter().copied());
            if !track.typhoon.is_empty() && points.len() >= 2 {
                map.add_object(MapObject::Path {
                    points,
                    style: style.typhoon_track.clone(),
                });
            }
        }

        map.add_object(MapObject::Marker {
            position: req.center,
            style: style.marker.clone(),
        });

        map
    }

    /// Resolve the viewport: the explicit center, else the first object.
    pub fn viewport(&self) -> GenMapResult<Viewport> {
        self.options.validate()?;

        let center = self
            .center
            .or_else(|| self.objects.iter().find_map(MapObject::anchor))
            .ok_or_else(|| GenMapError::Render("map has neither center nor objects".to_string()))?;

        Ok(Viewport::new(center, &self.options))
    }

    /// Fetch every tile covering the viewport, at most
    /// `MAX_CONCURRENT_TILE_FETCHES` at a time. Stops at the first failure.
    pub async fn fetch_tiles(
        &self,
        viewport: &Viewport,
        provider: &dyn TileProvider,
    ) -> GenMapResult<Vec<(TilePlacement, RgbaImage)>> {
        let placements = viewport.tile_placements();
        debug!(tiles = placements.len(), zoom = viewport.zoom, "Fetching tiles");

        // `buffered` keeps results in placement order.
        let fetches: Vec<_> = placements.iter().map(|p| provider.fetch(p.coord)).collect();
        let tiles: Vec<RgbaImage> =
            stream::iter(fetches)
                .buffered(MAX_CONCURRENT_TILE_FETCHES)
                .try_collect()
                .await?;
        Ok(placements.into_iter().zip(tiles).collect())
    }

    /// Composite fetched tiles and draw overlays. CPU-bound.
    pub fn compose(
        &self,
        viewport: &Viewport,
        tiles: Vec<(TilePlacement, RgbaImage)>,
    ) -> GenMapResult<RgbaImage> {
        let mut canvas = RgbaImage::from_pixel(viewport.width, viewport.height, self.background);

        let mut blended = false;
        for (placement, tile) in &tiles {
            if tile.pixels().all(|p| p.0[3] == u8::MAX) {
                imageops::replace(&mut canvas, tile, placement.dest_x, placement.dest_y);
            } else {
                imageops::overlay(&mut canvas, tile, placement.dest_x, placement.dest_y);
                blended = true;
            }
        }
        if blended {
            for pixel in canvas.pixels_mut() {
                pixel.0[3] = u8::MAX;
            }
        }

        // The canvas is opaque at this point, so its straight RGBA bytes are
        // also valid premultiplied pixmap data, and stay so after drawing.
        let size = IntSize::from_wh(viewport.width, viewport.height)
            .ok_or_else(|| GenMapError::Render("invalid canvas size".to_string()))?;
        let mut pixmap = Pixmap::from_vec(canvas.into_raw(), size)
            .ok_or_else(|| GenMapError::Render("failed to create pixmap".to_string()))?;

        for object in &self.objects {
            object.draw(&mut pixmap, viewport);
        }

        RgbaImage::from_raw(viewport.width, viewport.height, pixmap.take())
            .ok_or_else(|| GenMapError::Render("pixmap size mismatch".to_string()))
    }

    /// Fetch tiles and compose the final image.
    pub async fn render(&self, provider: &dyn TileProvider) -> GenMapResult<RgbaImage> {
        let viewport = self.viewport()?;
        let tiles = self.fetch_tiles(&viewport, provider).await?;
        self.compose(&viewport, tiles)
    }
}

fn area_object(area: &WarningArea, style: &AreaStyle) -> MapObject {
    match area {
        WarningArea::Circle { center, radius } => MapObject::Circle {
            center: *center,
            radius_m: *radius,
            style: style.clone(),
        },
        WarningArea::Arc { arc } => MapObject::Sector {
            center: arc.center(),
            radius_m: arc.radius_m(),
            start_deg: arc.start_bearing(),
            sweep_deg: arc.sweep(),
            style: style.clone(),
        },
    }
}
