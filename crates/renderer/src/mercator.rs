//! Web Mercator (EPSG:3857) math in world-pixel space.
//!
//! A world-pixel coordinate at zoom `z` spans `256 * 2^z` pixels around the
//! equator, with the origin at the north-west corner of tile `z/0/0`.

use std::f64::consts::PI;

use genmap_common::LatLng;

/// Edge length of a slippy-map tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// World size in pixels at the given zoom.
pub fn world_size(zoom: u8) -> f64 {
    TILE_SIZE as f64 * 2f64.powi(zoom as i32)
}

/// Project a position to world pixels.
///
/// Longitudes outside [-180, 180] are projected linearly so that callers can
/// keep a track continuous across the antimeridian.
pub fn lat_lng_to_world_px(lat: f64, lng: f64, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let x = (lng + 180.0) / 360.0 * size;

    let sin_lat = lat.to_radians().sin().clamp(-0.9999, 0.9999);
    let y = (0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI)) * size;

    (x, y)
}

/// Inverse of [`lat_lng_to_world_px`].
pub fn world_px_to_lat_lng(x: f64, y: f64, zoom: u8) -> (f64, f64) {
    let size = world_size(zoom);
    let lng = x / size * 360.0 - 180.0;
    let n = PI - 2.0 * PI * y / size;
    let lat = n.sinh().atan().to_degrees();
    (lat, lng)
}

/// Shift `lng` by multiples of 360 so it lies within 180 degrees of `reference`.
pub fn unwrap_lng(lng: f64, reference: f64) -> f64 {
    reference + (lng - reference + 180.0).rem_euclid(360.0) - 180.0
}

/// Great-circle destination from `origin` along `bearing_deg` (clockwise from
/// north) for `distance_m` meters.
///
/// The returned longitude is not normalized.
pub fn destination_point(origin: LatLng, bearing_deg: f64, distance_m: f64) -> LatLng {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let phi1 = origin.lat.to_radians();
    let lambda1 = origin.lng.to_radians();

    let sin_phi2 = phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos();
    let phi2 = sin_phi2.clamp(-1.0, 1.0).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * sin_phi2);

    LatLng {
        lat: phi2.to_degrees(),
        lng: lambda2.to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_is_world_center() {
        let (x, y) = lat_lng_to_world_px(0.0, 0.0, 0);
        assert!((x - 128.0).abs() < 1e-9);
        assert!((y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_world_size_doubles_per_zoom() {
        assert_eq!(world_size(0), 256.0);
        assert_eq!(world_size(6), 16384.0);
    }

    #[test]
    fn test_projection_roundtrip() {
        for (lat, lng) in [(31.2, 130.5), (-33.9, 151.2), (60.0, -150.0), (0.0, 179.9)] {
            let (x, y) = lat_lng_to_world_px(lat, lng, 6);
            let (lat2, lng2) = world_px_to_lat_lng(x, y, 6);
            assert!((lat - lat2).abs() < 1e-6, "lat {} -> {}", lat, lat2);
            assert!((lng - lng2).abs() < 1e-6, "lng {} -> {}", lng, lng2);
        }
    }

    #[test]
    fn test_north_is_up() {
        let (_, y_north) = lat_lng_to_world_px(40.0, 135.0, 6);
        let (_, y_south) = lat_lng_to_world_px(10.0, 135.0, 6);
        assert!(y_north < y_south);
    }

    #[test]
    fn test_unwrap_lng() {
        assert_eq!(unwrap_lng(-179.0, 179.0), 181.0);
        assert_eq!(unwrap_lng(179.0, -179.0), -181.0);
        assert_eq!(unwrap_lng(135.0, 130.0), 135.0);
        assert_eq!(unwrap_lng(-170.0 + 360.0, 0.0), -170.0);
    }

    #[test]
    fn test_destination_point_north() {
        let origin = LatLng { lat: 0.0, lng: 135.0 };
        // One degree of arc along a meridian.
        let one_deg = EARTH_RADIUS_M * PI / 180.0;
        let dest = destination_point(origin, 0.0, one_deg);
        assert!((dest.lat - 1.0).abs() < 1e-9);
        assert!((dest.lng - 135.0).abs() < 1e-9);
    }

    #[test]
    fn test_destination_point_east_on_equator() {
        let origin = LatLng { lat: 0.0, lng: 179.5 };
        let one_deg = EARTH_RADIUS_M * PI / 180.0;
        let dest = destination_point(origin, 90.0, one_deg);
        assert!(dest.lat.abs() < 1e-9);
        assert!((dest.lng - 180.5).abs() < 1e-9);
    }
}
