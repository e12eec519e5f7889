use tiny_skia::Pixmap;
use vellum_types::Color;

use crate::RasterError;

/// One captured bitmap of the whole stage.
///
/// Never mutated after capture. Pages are read out of it as [`PageSlice`]s.
pub struct Raster {
    pixmap: Pixmap,
    scale: f32,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("scale", &self.scale)
            .finish()
    }
}

impl Raster {
    pub(crate) fn from_pixmap(pixmap: Pixmap, scale: f32) -> Self {
        Self { pixmap, scale }
    }

    /// A raster of a single flat color.
    pub fn filled(width: u32, height: u32, scale: f32, color: Color) -> Result<Self, RasterError> {
        let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
            RasterError::Unavailable(format!("cannot allocate a {}x{} surface", width, height))
        })?;
        pixmap.fill(crate::paint::sk_color(color));
        Ok(Self { pixmap, scale })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Device pixels per CSS pixel.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// A band of rows, or `None` when the band is empty or leaves the raster.
    pub fn slice(&self, index: usize, y_offset: u32, height: u32) -> Option<PageSlice<'_>> {
        let end = y_offset.checked_add(height)?;
        if height == 0 || end > self.height() {
            return None;
        }
        Some(PageSlice {
            raster: self,
            index,
            y_offset,
            height,
        })
    }

    /// Packed RGB bytes for rows `[y, y + height)`, composited over white.
    fn rgb_rows(&self, y: u32, height: u32) -> Vec<u8> {
        let row_bytes = self.width() as usize * 4;
        let start = y as usize * row_bytes;
        let end = start + height as usize * row_bytes;
        let data = &self.pixmap.data()[start..end];

        let mut out = Vec::with_capacity(data.len() / 4 * 3);
        for px in data.chunks_exact(4) {
            // Premultiplied: over white is channel + (255 - alpha).
            let cover = 255 - px[3];
            out.push(px[0].saturating_add(cover));
            out.push(px[1].saturating_add(cover));
            out.push(px[2].saturating_add(cover));
        }
        out
    }
}

/// One page's worth of rows inside a [`Raster`].
#[derive(Debug, Clone, Copy)]
pub struct PageSlice<'a> {
    raster: &'a Raster,
    index: usize,
    y_offset: u32,
    height: u32,
}

impl<'a> PageSlice<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn y_offset(&self) -> u32 {
        self.y_offset
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    /// Exclusive end row.
    pub fn end(&self) -> u32 {
        self.y_offset + self.height
    }

    pub fn raster(&self) -> &'a Raster {
        self.raster
    }

    pub fn to_rgb(&self) -> Vec<u8> {
        self.raster.rgb_rows(self.y_offset, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_are_bounds_checked() {
        let raster = Raster::filled(4, 10, 1.0, Color::WHITE).unwrap();
        assert!(raster.slice(0, 0, 10).is_some());
        assert!(raster.slice(0, 5, 6).is_none());
        assert!(raster.slice(0, 3, 0).is_none());
        assert!(raster.slice(0, u32::MAX, 2).is_none());
    }

    #[test]
    fn band_bytes_are_rgb() {
        let raster = Raster::filled(3, 4, 2.0, Color::rgb(10, 20, 30)).unwrap();
        let slice = raster.slice(1, 2, 2).unwrap();
        let rgb = slice.to_rgb();
        assert_eq!(rgb.len(), 3 * 2 * 3);
        assert_eq!(&rgb[..3], &[10, 20, 30]);
        assert_eq!(slice.end(), 4);
    }

    #[test]
    fn zero_sized_surface_is_unavailable() {
        let err = Raster::filled(0, 10, 1.0, Color::WHITE).unwrap_err();
        assert!(matches!(err, RasterError::Unavailable(_)));
    }
}
