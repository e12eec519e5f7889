//! Text shaping and line breaking.

pub mod shaper;
pub mod wrapper;

pub use shaper::{shape, ShapedGlyph, ShapedText};
pub use wrapper::{break_lines, LineBreak};
