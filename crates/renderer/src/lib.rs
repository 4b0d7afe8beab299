//! Static map rendering for typhoon position maps.
//!
//! Implements:
//! - Web Mercator projection math
//! - Tile providers (HTTP slippy-map servers, solid fill)
//! - Vector overlays (marker, track, warning areas)
//! - WebP/PNG encoding

pub mod encode;
pub mod mercator;
pub mod overlay;
pub mod staticmap;
pub mod style;
pub mod tiles;

pub use encode::{encode_image, ImageFormat};
pub use overlay::MapObject;
pub use staticmap::{MapOptions, StaticMap, Viewport};
pub use style::{Color, MapStyle};
pub use tiles::{HttpTileProvider, SolidTileProvider, TileCoord, TileProvider, TileSourceConfig};
