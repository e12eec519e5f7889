//! Physical page sizes.
//!
//! Sizes are stored in PDF points (1/72 inch). Named sizes follow ISO 216 and
//! the US Letter convention.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::geometry::Size;

const POINTS_PER_MM: f32 = 72.0 / 25.4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

impl PageSize {
    /// ISO A4, 210 × 297 mm.
    pub const A4: PageSize = PageSize {
        width_pt: 595.275_6,
        height_pt: 841.889_8,
    };

    /// US Letter, 8.5 × 11 in.
    pub const LETTER: PageSize = PageSize {
        width_pt: 612.0,
        height_pt: 792.0,
    };

    pub fn from_mm(width_mm: f32, height_mm: f32) -> Self {
        Self {
            width_pt: width_mm * POINTS_PER_MM,
            height_pt: height_mm * POINTS_PER_MM,
        }
    }

    pub fn width_mm(&self) -> f32 {
        self.width_pt / POINTS_PER_MM
    }

    pub fn height_mm(&self) -> f32 {
        self.height_pt / POINTS_PER_MM
    }

    pub fn as_size(&self) -> Size {
        Size::new(self.width_pt, self.height_pt)
    }

    /// Height of one page in a pixel space whose width is `width_px`.
    ///
    /// The physical aspect ratio is preserved and the result is rounded to
    /// the nearest whole pixel, never below one.
    pub fn height_for_width_px(&self, width_px: u32) -> u32 {
        let height = (width_px as f64) * (self.height_pt as f64) / (self.width_pt as f64);
        (height.round() as u32).max(1)
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::A4
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}x{:.0}mm", self.width_mm(), self.height_mm())
    }
}

impl FromStr for PageSize {
    type Err = String;

    /// Accepts `A4`, `Letter`, or `<width>x<height>mm`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim().to_ascii_lowercase();
        match raw.as_str() {
            "a4" => return Ok(PageSize::A4),
            "letter" => return Ok(PageSize::LETTER),
            _ => {}
        }

        let dims = raw
            .strip_suffix("mm")
            .ok_or_else(|| format!("Unknown page size: {}", s))?;
        let (w, h) = dims
            .split_once('x')
            .ok_or_else(|| format!("Expected <width>x<height>mm, got: {}", s))?;
        let w: f32 = w.trim().parse().map_err(|_| format!("Invalid page width in: {}", s))?;
        let h: f32 = h.trim().parse().map_err(|_| format!("Invalid page height in: {}", s))?;
        if w <= 0.0 || h <= 0.0 {
            return Err(format!("Page dimensions must be positive: {}", s));
        }
        Ok(PageSize::from_mm(w, h))
    }
}

impl<'de> Deserialize<'de> for PageSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum PageSizeDef {
            Named(String),
            #[serde(rename_all = "camelCase")]
            Points { width_pt: f32, height_pt: f32 },
        }

        match PageSizeDef::deserialize(deserializer)? {
            PageSizeDef::Named(name) => name.parse().map_err(de::Error::custom),
            PageSizeDef::Points {
                width_pt,
                height_pt,
            } => Ok(PageSize {
                width_pt,
                height_pt,
            }),
        }
    }
}
