//! Layout for the export stage.
//!
//! Resolves fonts, shapes and wraps text, and flows a [`LayoutFragment`] at a
//! fixed width into a [`DisplayList`] the rasterizer can paint.
//!
//! [`LayoutFragment`]: vellum_content::LayoutFragment

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Stage width {width:.2} leaves no room for content after {padding:.2} of padding.")]
    InvalidWidth { width: f32, padding: f32 },
}

pub mod display;
pub mod flow;
pub mod fonts;
pub mod text;

pub use self::display::{DisplayItem, DisplayList, PlacedGlyph, TextRun};
pub use self::flow::{LayoutEngine, SettledAssets};
pub use self::fonts::{FontData, FontInstance, FontLibrary};
