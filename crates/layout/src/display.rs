//! Output of the layout pass.
//!
//! A `DisplayList` is the laid-out stage content: positioned paint commands in
//! CSS pixels, top to bottom, over a fixed width and an unbounded height.

use crate::fonts::FontData;
use vellum_traits::SharedResourceData;
use vellum_types::{Color, Rect};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    pub id: u16,
    /// Offset from the run origin.
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone)]
pub struct TextRun {
    pub x: f32,
    pub baseline: f32,
    pub size: f32,
    pub color: Color,
    pub width: f32,
    /// `None` when the face did not settle; such runs occupy space but do not paint.
    pub font: Option<FontData>,
    pub glyphs: Vec<PlacedGlyph>,
    pub text: String,
}

#[derive(Debug, Clone)]
pub enum DisplayItem {
    Fill { rect: Rect, color: Color },
    Text(TextRun),
    Image {
        rect: Rect,
        src: String,
        /// Encoded image bytes, when the asset settled in time.
        data: Option<SharedResourceData>,
    },
}

#[derive(Debug, Clone)]
pub struct DisplayList {
    pub width: f32,
    pub height: f32,
    pub background: Color,
    pub items: Vec<DisplayItem>,
}

impl DisplayList {
    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.items.iter().filter_map(|item| match item {
            DisplayItem::Text(run) => Some(run),
            _ => None,
        })
    }

    /// Sources of every image item, in paint order.
    pub fn image_sources(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            DisplayItem::Image { src, .. } => Some(src.as_str()),
            _ => None,
        })
    }

    /// Device pixel size of the list painted at `scale`.
    pub fn pixel_size(&self, scale: f32) -> (u32, u32) {
        (
            (self.width * scale).ceil() as u32,
            (self.height * scale).ceil() as u32,
        )
    }
}
