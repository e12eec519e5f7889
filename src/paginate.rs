//! Slicing a tall raster into page-height bands.
//!
//! A raster of height `H` and a page height `P` yields `ceil(H / P)` bands.
//! Band `i` covers rows `[i * P, min(H, (i + 1) * P))`. The last band may be
//! shorter than `P`; it is never padded, and no band is ever empty.

use thiserror::Error;
use vellum_raster::{PageSlice, Raster};
use vellum_types::PageSize;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Page height must be at least one pixel")]
    ZeroPageHeight,

    #[error("Raster has no rows to paginate")]
    EmptyRaster,

    #[error("Band [{start}, {end}) lies outside a raster {height}px tall")]
    OutOfBounds { start: u32, end: u32, height: u32 },
}

/// Row ranges `(y_offset, height)` of each page.
pub fn page_bands(total_height: u32, page_height: u32) -> Result<Vec<(u32, u32)>, PaginationError> {
    if page_height == 0 {
        return Err(PaginationError::ZeroPageHeight);
    }
    if total_height == 0 {
        return Err(PaginationError::EmptyRaster);
    }

    let mut bands = Vec::with_capacity(total_height.div_ceil(page_height) as usize);
    let mut y = 0;
    while y < total_height {
        let height = page_height.min(total_height - y);
        bands.push((y, height));
        y += height;
    }
    Ok(bands)
}

/// Slices `raster` into pages `page_height_px` rows tall.
pub fn paginate(raster: &Raster, page_height_px: u32) -> Result<Vec<PageSlice<'_>>, PaginationError> {
    let bands = page_bands(raster.height(), page_height_px)?;
    let slices = bands
        .into_iter()
        .enumerate()
        .map(|(index, (y, height))| {
            raster
                .slice(index, y, height)
                .ok_or(PaginationError::OutOfBounds {
                    start: y,
                    end: y.saturating_add(height),
                    height: raster.height(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!(
        "Paginated {}px into {} page(s) of {}px",
        raster.height(),
        slices.len(),
        page_height_px
    );
    Ok(slices)
}

/// Page height in the raster's pixel space, keeping the page's aspect ratio.
pub fn page_height_px(page_size: &PageSize, raster: &Raster) -> u32 {
    page_size.height_for_width_px(raster.width())
}
