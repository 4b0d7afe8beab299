//! Request and response bodies of the `/genmap` endpoint.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::{GenMapError, GenMapResult, LatLng, TcTrack, WarningArea};

/// Body of `POST /genmap`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenMapRequest {
    /// Typhoon number, e.g. `2410`.
    pub typhoon_number: String,
    /// Validity time of the position (RFC 3339).
    pub validtime: DateTime<FixedOffset>,
    /// Position of the storm center.
    #[serde(alias = "latLng")]
    pub center: LatLng,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<TcTrack>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storm_warning_area: Option<WarningArea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gale_warning_area: Option<WarningArea>,
}

impl GenMapRequest {
    /// Decode and validate a request body.
    pub fn from_json(body: &[u8]) -> GenMapResult<Self> {
        let req: GenMapRequest = serde_json::from_slice(body)
            .map_err(|e| GenMapError::InvalidRequest(format!("malformed body: {}", e)))?;
        req.validate()?;
        Ok(req)
    }

    pub fn validate(&self) -> GenMapResult<()> {
        validate_typhoon_number(&self.typhoon_number)?;
        self.center.validate()?;

        if let Some(track) = &self.track {
            for pos in track.points() {
                pos.validate()?;
            }
        }
        for area in self.warning_areas() {
            area.validate()?;
        }
        Ok(())
    }

    /// Warning areas present on the request, gale first so the storm area
    /// is drawn on top.
    pub fn warning_areas(&self) -> impl Iterator<Item = &WarningArea> {
        self.gale_warning_area
            .iter()
            .chain(self.storm_warning_area.iter())
    }

    /// Object key for the rendered image: `{number}/{YYYYMMDDhhmm}.{ext}`.
    ///
    /// The timestamp is formatted in the offset the caller sent.
    pub fn object_key(&self, ext: &str) -> String {
        format!(
            "{}/{}.{}",
            self.typhoon_number,
            self.validtime.format("%Y%m%d%H%M"),
            ext
        )
    }
}

fn validate_typhoon_number(number: &str) -> GenMapResult<()> {
    if number.is_empty() {
        return Err(GenMapError::InvalidRequest(
            "typhoonNumber must not be empty".to_string(),
        ));
    }
    if !number
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(GenMapError::InvalidRequest(format!(
            "typhoonNumber '{}' contains characters not allowed in an object key",
            number
        )));
    }
    Ok(())
}

/// Body returned on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenMapResponse {
    pub url: String,
}

/// Join the public bucket URL and an object key.
pub fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "typhoonNumber": "2410",
        "validtime": "2024-08-29T09:00:00+09:00",
        "center": [31.2, 130.5],
        "track": {
            "preTyphoon": [[18.0, 142.0], [20.1, 140.3]],
            "typhoon": [[24.0, 136.0], [28.9, 132.1]]
        },
        "stormWarningArea": {"center": [31.2, 130.5], "radius": 190000},
        "galeWarningArea": {"arc": [[31.0, 130.6], 500000, [0, 180]]}
    }"#;

    #[test]
    fn test_decode_full_request() {
        let req = GenMapRequest::from_json(FULL.as_bytes()).unwrap();
        assert_eq!(req.typhoon_number, "2410");
        assert_eq!(req.center, LatLng { lat: 31.2, lng: 130.5 });
        assert_eq!(req.track.as_ref().unwrap().typhoon.len(), 2);
        assert_eq!(req.warning_areas().count(), 2);
    }

    #[test]
    fn test_legacy_latlng_field() {
        let body = r#"{"typhoonNumber": "2401", "validtime": "2024-01-01T00:00:00Z", "latLng": [10.0, 150.0]}"#;
        let req = GenMapRequest::from_json(body.as_bytes()).unwrap();
        assert_eq!(req.center, LatLng { lat: 10.0, lng: 150.0 });
        assert!(req.track.is_none());
    }

    #[test]
    fn test_object_key_keeps_offset() {
        let req = GenMapRequest::from_json(FULL.as_bytes()).unwrap();
        assert_eq!(req.object_key("webp"), "2410/202408290900.webp");
    }

    #[test]
    fn test_object_key_utc() {
        let body = r#"{"typhoonNumber": "2401", "validtime": "2024-01-01T03:05:00Z", "center": [10.0, 150.0]}"#;
        let req = GenMapRequest::from_json(body.as_bytes()).unwrap();
        assert_eq!(req.object_key("png"), "2401/202401010305.png");
    }

    #[test]
    fn test_rejects_short_center() {
        let body = r#"{"typhoonNumber": "2401", "validtime": "2024-01-01T00:00:00Z", "center": [10.0]}"#;
        let err = GenMapRequest::from_json(body.as_bytes()).unwrap_err();
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_rejects_bad_track_point() {
        let body = r#"{"typhoonNumber": "2401", "validtime": "2024-01-01T00:00:00Z",
            "center": [10.0, 150.0], "track": {"typhoon": [[10.0, 150.0, 3.0]]}}"#;
        assert!(GenMapRequest::from_json(body.as_bytes()).is_err());
    }

    #[test]
    fn test_rejects_path_in_typhoon_number() {
        let body = r#"{"typhoonNumber": "../2401", "validtime": "2024-01-01T00:00:00Z", "center": [10.0, 150.0]}"#;
        let err = GenMapRequest::from_json(body.as_bytes()).unwrap_err();
        assert!(matches!(err, GenMapError::InvalidRequest(_)));
    }

    #[test]
    fn test_typhoon_number_charset() {
        assert!(validate_typhoon_number("TC-2410_a").is_ok());
        for bad in ["", "24 10", "2410.webp", "24%2F10", "台風10"] {
            assert!(
                validate_typhoon_number(bad).is_err(),
                "accepted {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = GenMapRequest::from_json(b"{not json").unwrap_err();
        assert_eq!(err.http_status_code(), 400);
    }

    #[test]
    fn test_public_url_join() {
        assert_eq!(
            public_url("https://maps.example.com/", "2410/202408290900.webp"),
            "https://maps.example.com/2410/202408290900.webp"
        );
        assert_eq!(
            public_url("https://maps.example.com", "a/b.webp"),
            "https://maps.example.com/a/b.webp"
        );
    }
}
