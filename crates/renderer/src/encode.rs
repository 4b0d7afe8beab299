//! Image encoding for rendered maps.

use std::io::Cursor;

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use genmap_common::{GenMapError, GenMapResult};

/// Default WebP quality (0-100).
pub const DEFAULT_WEBP_QUALITY: f32 = 90.0;

/// Output formats for rendered maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Webp,
    Png,
}

impl ImageFormat {
    /// File extension used in object keys.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Webp => "webp",
            ImageFormat::Png => "png",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Webp => "image/webp",
            ImageFormat::Png => "image/png",
        }
    }
}

/// Encode an image in the requested format.
///
/// `quality` only applies to WebP and is clamped to 0-100.
pub fn encode_image(img: &RgbaImage, format: ImageFormat, quality: f32) -> GenMapResult<Vec<u8>> {
    match format {
        ImageFormat::Webp => encode_webp(img, quality),
        ImageFormat::Png => encode_png(img),
    }
}

/// Lossy WebP with alpha.
pub fn encode_webp(img: &RgbaImage, quality: f32) -> GenMapResult<Vec<u8>> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(GenMapError::Encode("cannot encode an empty image".to_string()));
    }

    let encoder = webp::Encoder::from_rgba(img.as_raw(), width, height);
    let data = encoder.encode(quality.clamp(0.0, 100.0));
    Ok(data.to_vec())
}

pub fn encode_png(img: &RgbaImage) -> GenMapResult<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png)
        .map_err(|e| GenMapError::Encode(format!("Failed to encode PNG: {}", e)))?;
    Ok(buf)
}
