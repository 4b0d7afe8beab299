//! Style configuration for map overlays.

use std::fmt;

use serde::{Deserialize, Serialize};

/// RGBA color, written as `#RRGGBB` or `#RRGGBBAA` in style files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self([r, g, b, a])
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        let [r, g, b, a] = self.0;
        tiny_skia::Color::from_rgba8(r, g, b, a)
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        hex_to_rgba(&value).ok_or_else(|| format!("invalid color '{}'", value))
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b, a] = self.0;
        write!(f, "#{:02X}{:02X}{:02X}{:02X}", r, g, b, a)
    }
}

/// Parse hex color string to RGBA. Alpha defaults to opaque.
pub fn hex_to_rgba(hex: &str) -> Option<Color> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() || (hex.len() != 6 && hex.len() != 8) {
        return None;
    }

    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    let a = if hex.len() == 8 {
        u8::from_str_radix(&hex[6..8], 16).ok()?
    } else {
        255
    };

    Some(Color([r, g, b, a]))
}

/// Position marker (map pin).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub color: Color,
    /// Pin height in pixels.
    pub size: f32,
}

/// Polyline style.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: Color,
    pub width: f32,
    #[serde(default)]
    pub dashed: bool,
}

/// Filled area with an outline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AreaStyle {
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f32,
}

/// Style of every overlay drawn on a typhoon map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapStyle {
    pub marker: MarkerStyle,
    pub pre_typhoon_track: LineStyle,
    pub typhoon_track: LineStyle,
    pub storm_area: AreaStyle,
    pub gale_area: AreaStyle,
    /// Shown where no tile covers the canvas (beyond the poles).
    pub background: Color,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            marker: MarkerStyle {
                color: Color::rgba(255, 0, 0, 255),
                size: 16.0,
            },
            pre_typhoon_track: LineStyle {
                color: Color::rgba(90, 90, 90, 230),
                width: 2.0,
                dashed: true,
            },
            typhoon_track: LineStyle {
                color: Color::rgba(20, 20, 20, 255),
                width: 2.5,
                dashed: false,
            },
            storm_area: AreaStyle {
                fill: Color::rgba(255, 0, 0, 80),
                stroke: Color::rgba(220, 0, 0, 230),
                stroke_width: 2.0,
            },
            gale_area: AreaStyle {
                fill: Color::rgba(255, 210, 0, 70),
                stroke: Color::rgba(230, 170, 0, 230),
                stroke_width: 2.0,
            },
            background: Color::rgba(170, 211, 223, 255),
        }
    }
}

impl MapStyle {
    /// Load a style from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json_str)
    }

    /// Load a style from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }
}
