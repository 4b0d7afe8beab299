//! Common types shared by the genmap crates.

pub mod error;
pub mod geo;
pub mod request;

pub use error::{GenMapError, GenMapResult};
pub use geo::{ArcSector, LatLng, TcTrack, WarningArea};
pub use request::{public_url, GenMapRequest, GenMapResponse};
