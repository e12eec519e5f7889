//! Paints a [`DisplayList`] into a [`Raster`] with tiny-skia.

use tiny_skia::{
    FillRule, FilterQuality, Paint, Path, PathBuilder, Pixmap, PixmapPaint, Rect, Transform,
};
use ttf_parser::{GlyphId, OutlineBuilder};
use vellum_layout::{DisplayItem, DisplayList, TextRun};
use vellum_types::Color;

use crate::origin::OriginPolicy;
use crate::{Raster, RasterError};

/// Captures `list` at `scale` device pixels per CSS pixel.
///
/// Fails without painting when an image would taint the capture, or when the
/// surface cannot be allocated. No partial raster is ever returned.
pub fn paint(list: &DisplayList, scale: f32, policy: &OriginPolicy) -> Result<Raster, RasterError> {
    for src in list.image_sources() {
        policy.check(src)?;
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RasterError::Unavailable(format!("invalid device scale {}", scale)));
    }

    let (width, height) = list.pixel_size(scale);
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        RasterError::Unavailable(format!("cannot allocate a {}x{} surface", width, height))
    })?;
    pixmap.fill(sk_color(list.background));

    let device = Transform::from_scale(scale, scale);
    for item in &list.items {
        match item {
            DisplayItem::Fill { rect, color } => fill_rect(&mut pixmap, rect, *color, device),
            DisplayItem::Text(run) => draw_text_run(&mut pixmap, run, device),
            DisplayItem::Image { rect, src, data } => match data {
                Some(bytes) => match decode_image_to_pixmap(bytes) {
                    Some(image) => draw_image(&mut pixmap, &image, rect, device),
                    None => log::warn!("Image '{}' could not be decoded; leaving its box blank", src),
                },
                None => log::debug!("Image '{}' did not settle; leaving its box blank", src),
            },
        }
    }

    log::debug!("Painted raster {}x{} at scale {}", width, height, scale);
    Ok(Raster::from_pixmap(pixmap, scale))
}

fn fill_rect(pixmap: &mut Pixmap, rect: &vellum_types::Rect, color: Color, device: Transform) {
    if let Some(r) = Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) {
        pixmap.fill_rect(r, &fill_paint(color), device, None);
    }
}

fn draw_text_run(pixmap: &mut Pixmap, run: &TextRun, device: Transform) {
    let Some(font) = &run.font else {
        return;
    };
    let Ok(face) = ttf_parser::Face::parse(&font.data, 0) else {
        return;
    };
    let font_scale = run.size / face.units_per_em().max(1) as f32;
    let paint = fill_paint(run.color);

    for glyph in &run.glyphs {
        let mut builder = GlyphPathBuilder::new(font_scale);
        if face.outline_glyph(GlyphId(glyph.id), &mut builder).is_none() {
            // Spaces and other blank glyphs have no outline.
            continue;
        }
        let Some(path) = builder.finish() else {
            continue;
        };
        // Font units grow upwards; flip around the baseline.
        let local = Transform::from_row(
            1.0,
            0.0,
            0.0,
            -1.0,
            run.x + glyph.x,
            run.baseline + glyph.y,
        );
        pixmap.fill_path(&path, &paint, FillRule::Winding, device.pre_concat(local), None);
    }
}

fn draw_image(pixmap: &mut Pixmap, image: &Pixmap, rect: &vellum_types::Rect, device: Transform) {
    let (src_w, src_h) = (image.width() as f32, image.height() as f32);
    if src_w <= 0.0 || src_h <= 0.0 || rect.is_empty() {
        return;
    }
    let local = Transform::from_row(
        rect.width / src_w,
        0.0,
        0.0,
        rect.height / src_h,
        rect.x,
        rect.y,
    );
    let paint = PixmapPaint {
        quality: FilterQuality::Bicubic,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, device.pre_concat(local), None);
}

struct GlyphPathBuilder {
    builder: PathBuilder,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            scale,
        }
    }

    fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x * self.scale, y * self.scale);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x * self.scale, y * self.scale);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let s = self.scale;
        self.builder.quad_to(x1 * s, y1 * s, x * s, y * s);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let s = self.scale;
        self.builder.cubic_to(x1 * s, y1 * s, x2 * s, y2 * s, x * s, y * s);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

fn fill_paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(sk_color(color));
    paint.anti_alias = true;
    paint
}

pub(crate) fn sk_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(
        color.r,
        color.g,
        color.b,
        (color.a.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

fn decode_image_to_pixmap(data: &[u8]) -> Option<Pixmap> {
    let decoded = image::load_from_memory(data).ok()?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut pixmap = Pixmap::new(width, height)?;
    for (src, dst) in rgba.as_raw().chunks_exact(4).zip(pixmap.data_mut().chunks_exact_mut(4)) {
        let a = src[3];
        dst[0] = premul_u8(src[0], a);
        dst[1] = premul_u8(src[1], a);
        dst[2] = premul_u8(src[2], a);
        dst[3] = a;
    }
    Some(pixmap)
}

fn premul_u8(channel: u8, alpha: u8) -> u8 {
    let prod = (channel as u16) * (alpha as u16) + 127;
    ((prod + (prod >> 8)) >> 8) as u8
}
