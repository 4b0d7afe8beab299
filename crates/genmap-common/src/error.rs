//! Error types for the genmap service.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using GenMapError.
pub type GenMapResult<T> = Result<T, GenMapError>;

/// Primary error type for map generation.
#[derive(Debug, Error)]
pub enum GenMapError {
    // === Request Errors ===
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),

    // === Rendering Errors ===
    #[error("Failed to fetch map tile: {0}")]
    TileFetch(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    // === Storage Errors ===
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Upload timed out after {0:?}")]
    UploadTimeout(Duration),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl GenMapError {
    /// Get the HTTP status code for this error.
    ///
    /// Anything the caller sent wrong is a 400; everything past validation
    /// is reported as a 500.
    pub fn http_status_code(&self) -> u16 {
        match self {
            GenMapError::InvalidRequest(_) | GenMapError::InvalidCoordinate(_) => 400,
            _ => 500,
        }
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            GenMapError::InvalidRequest(_) => "invalid_request",
            GenMapError::InvalidCoordinate(_) => "invalid_coordinate",
            GenMapError::TileFetch(_) => "tile_fetch",
            GenMapError::Render(_) => "render",
            GenMapError::Encode(_) => "encode",
            GenMapError::Storage(_) => "storage",
            GenMapError::UploadTimeout(_) => "upload_timeout",
            GenMapError::Internal(_) => "internal",
        }
    }
}

impl From<std::io::Error> for GenMapError {
    fn from(err: std::io::Error) -> Self {
        GenMapError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(GenMapError::InvalidRequest("x".into()).http_status_code(), 400);
        assert_eq!(GenMapError::InvalidCoordinate("x".into()).http_status_code(), 400);
        assert_eq!(GenMapError::TileFetch("x".into()).http_status_code(), 500);
        assert_eq!(GenMapError::Encode("x".into()).http_status_code(), 500);
        assert_eq!(
            GenMapError::UploadTimeout(Duration::from_secs(30)).http_status_code(),
            500
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = GenMapError::UploadTimeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Upload timed out after 30s");
        assert_eq!(err.kind(), "upload_timeout");
    }
}
