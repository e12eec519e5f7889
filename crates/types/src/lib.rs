pub mod color;
pub mod font;
pub mod geometry;
pub mod page;

pub use color::Color;
pub use font::{FontStyle, FontWeight};
pub use geometry::{Rect, Size};
pub use page::PageSize;
