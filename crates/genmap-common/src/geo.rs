//! Geographic value types carried by a map request.

use serde::{Deserialize, Serialize};

use crate::{GenMapError, GenMapResult};

/// Latitude limit of the Web Mercator projection.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

/// Largest warning-area radius accepted, in meters.
pub const MAX_RADIUS_M: f64 = 5_000_000.0;

/// A position in degrees. Serialized as a `[lat, lng]` array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 2]")]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Create a validated position.
    pub fn new(lat: f64, lng: f64) -> GenMapResult<Self> {
        let pos = Self { lat, lng };
        pos.validate()?;
        Ok(pos)
    }

    /// Build from a coordinate array, which must hold exactly `[lat, lng]`.
    pub fn from_slice(values: &[f64]) -> GenMapResult<Self> {
        match values {
            [lat, lng] => Self::new(*lat, *lng),
            _ => Err(GenMapError::InvalidCoordinate(format!(
                "expected [lat, lng], got {} element(s)",
                values.len()
            ))),
        }
    }

    /// Check that the position is finite and inside the renderable range.
    ///
    /// Longitudes up to 360 are allowed because West Pacific advisories
    /// are often expressed in 0..360.
    pub fn validate(&self) -> GenMapResult<()> {
        if !self.lat.is_finite() || !self.lng.is_finite() {
            return Err(GenMapError::InvalidCoordinate(format!(
                "non-finite coordinate [{}, {}]",
                self.lat, self.lng
            )));
        }
        if self.lat.abs() > MAX_MERCATOR_LAT {
            return Err(GenMapError::InvalidCoordinate(format!(
                "latitude {} outside ±{:.4}",
                self.lat, MAX_MERCATOR_LAT
            )));
        }
        if !(-180.0..=360.0).contains(&self.lng) {
            return Err(GenMapError::InvalidCoordinate(format!(
                "longitude {} outside [-180, 360]",
                self.lng
            )));
        }
        Ok(())
    }
}

impl TryFrom<Vec<f64>> for LatLng {
    type Error = GenMapError;

    fn try_from(values: Vec<f64>) -> GenMapResult<Self> {
        Self::from_slice(&values)
    }
}

impl From<LatLng> for [f64; 2] {
    fn from(pos: LatLng) -> Self {
        [pos.lat, pos.lng]
    }
}

/// Track of a tropical cyclone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TcTrack {
    /// Positions before the storm reached typhoon strength.
    #[serde(default)]
    pub pre_typhoon: Vec<LatLng>,
    /// Positions since it became a typhoon.
    #[serde(default)]
    pub typhoon: Vec<LatLng>,
}

impl TcTrack {
    pub fn is_empty(&self) -> bool {
        self.pre_typhoon.is_empty() && self.typhoon.is_empty()
    }

    /// All track points, pre-typhoon first.
    pub fn points(&self) -> impl Iterator<Item = &LatLng> {
        self.pre_typhoon.iter().chain(self.typhoon.iter())
    }
}

/// A sector of a warning area: `[center, radius_m, [start_deg, end_deg]]`.
///
/// Bearings are degrees clockwise from north; the sector sweeps clockwise
/// from the start bearing to the end bearing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcSector(pub LatLng, pub f64, pub [f64; 2]);

impl ArcSector {
    pub fn center(&self) -> LatLng {
        self.0
    }

    pub fn radius_m(&self) -> f64 {
        self.1
    }

    pub fn start_bearing(&self) -> f64 {
        self.2[0]
    }

    pub fn end_bearing(&self) -> f64 {
        self.2[1]
    }

    /// Clockwise sweep in degrees, in (0, 360].
    pub fn sweep(&self) -> f64 {
        let sweep = (self.end_bearing() - self.start_bearing()).rem_euclid(360.0);
        if sweep == 0.0 {
            360.0
        } else {
            sweep
        }
    }
}

/// Storm or gale warning area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WarningArea {
    Circle { center: LatLng, radius: f64 },
    Arc { arc: ArcSector },
}

impl WarningArea {
    pub fn center(&self) -> LatLng {
        match self {
            WarningArea::Circle { center, .. } => *center,
            WarningArea::Arc { arc } => arc.center(),
        }
    }

    /// Radius in meters.
    pub fn radius_m(&self) -> f64 {
        match self {
            WarningArea::Circle { radius, .. } => *radius,
            WarningArea::Arc { arc } => arc.radius_m(),
        }
    }

    pub fn validate(&self) -> GenMapResult<()> {
        self.center().validate()?;

        let radius = self.radius_m();
        if !radius.is_finite() || radius <= 0.0 || radius > MAX_RADIUS_M {
            return Err(GenMapError::InvalidRequest(format!(
                "warning area radius {} m outside (0, {}]",
                radius, MAX_RADIUS_M
            )));
        }

        if let WarningArea::Arc { arc } = self {
            if !arc.start_bearing().is_finite() || !arc.end_bearing().is_finite() {
                return Err(GenMapError::InvalidRequest(
                    "warning area arc bearings must be finite".to_string(),
                ));
            }
        }
        Ok(())
    }
}
