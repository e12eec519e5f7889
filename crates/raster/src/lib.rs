//! Rasterization of the laid-out stage.
//!
//! - [`paint`]: one display list in, one tall [`Raster`] out, at a fixed device scale.
//! - [`OriginPolicy`]: which image sources may be captured without tainting.
//! - [`PageSlice`]: a borrowed band of rows used to build one output page.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    #[error("Capture tainted by cross-origin image '{src}'")]
    Tainted { src: String },

    #[error("Capture surface unavailable: {0}")]
    Unavailable(String),

    #[error("Stage has not settled; nothing to capture")]
    NotSettled,
}

pub mod origin;
pub mod paint;
pub mod raster;

pub use self::origin::OriginPolicy;
pub use self::paint::paint;
pub use self::raster::{PageSlice, Raster};
