use crate::fonts::FontData;
use rustybuzz::{Feature, UnicodeBuffer};
use std::sync::OnceLock;
use ttf_parser::Tag;

/// Advance used for every character when no face could be loaded.
const FALLBACK_ADVANCE_EM: f32 = 0.55;
const FALLBACK_ASCENDER_EM: f32 = 0.8;
const FALLBACK_DESCENDER_EM: f32 = -0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct ShapedGlyph {
    pub id: u16,
    /// Byte offset of the source character in the shaped text.
    pub cluster: usize,
    pub x_advance: f32,
    pub x_offset: f32,
    pub y_offset: f32,
}

/// One shaped run of text. Distances are in the same unit as the font size.
#[derive(Debug, Clone)]
pub struct ShapedText {
    pub glyphs: Vec<ShapedGlyph>,
    pub width: f32,
    pub ascender: f32,
    /// Negative below the baseline.
    pub descender: f32,
    pub font: Option<FontData>,
}

impl ShapedText {
    /// Offset of the baseline from the top of a line box of `line_box` height.
    pub fn baseline_in(&self, line_box: f32) -> f32 {
        let content = self.ascender - self.descender;
        (line_box - content) / 2.0 + self.ascender
    }
}

/// Shapes `text` at `size` with the given face, or with fixed fallback metrics
/// when the face is missing.
pub fn shape(text: &str, font: Option<&FontData>, size: f32) -> ShapedText {
    let Some(font) = font else {
        return shape_fallback(text, size);
    };
    let Some(face) = font.as_face() else {
        log::warn!("Font data could not be parsed at shaping time; using fallback metrics");
        return shape_fallback(text, size);
    };

    static FEATURES: OnceLock<Vec<Feature>> = OnceLock::new();
    let features = FEATURES.get_or_init(|| {
        vec![
            Feature::new(Tag::from_bytes(b"liga"), 1, ..),
            Feature::new(Tag::from_bytes(b"kern"), 1, ..),
        ]
    });

    let scale = size / face.units_per_em() as f32;
    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(text);
    buffer.guess_segment_properties();
    let shaped = rustybuzz::shape(&face, features, buffer);

    let mut glyphs = Vec::with_capacity(shaped.len());
    let mut width = 0.0;
    for (info, pos) in shaped.glyph_infos().iter().zip(shaped.glyph_positions()) {
        let x_advance = pos.x_advance as f32 * scale;
        glyphs.push(ShapedGlyph {
            id: info.glyph_id as u16,
            cluster: info.cluster as usize,
            x_advance,
            x_offset: pos.x_offset as f32 * scale,
            y_offset: pos.y_offset as f32 * scale,
        });
        width += x_advance;
    }

    ShapedText {
        glyphs,
        width,
        ascender: face.ascender() as f32 * scale,
        descender: face.descender() as f32 * scale,
        font: Some(font.clone()),
    }
}

fn shape_fallback(text: &str, size: f32) -> ShapedText {
    let advance = size * FALLBACK_ADVANCE_EM;
    let glyphs: Vec<ShapedGlyph> = text
        .char_indices()
        .map(|(cluster, _)| ShapedGlyph {
            id: 0,
            cluster,
            x_advance: advance,
            x_offset: 0.0,
            y_offset: 0.0,
        })
        .collect();
    ShapedText {
        width: advance * glyphs.len() as f32,
        glyphs,
        ascender: size * FALLBACK_ASCENDER_EM,
        descender: size * FALLBACK_DESCENDER_EM,
        font: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_metrics_are_per_character() {
        let shaped = shape("héllo", None, 10.0);
        assert_eq!(shaped.glyphs.len(), 5);
        assert!((shaped.width - 27.5).abs() < 1e-4);
        // 'é' is two bytes wide, so the next cluster starts at 3.
        assert_eq!(shaped.glyphs[2].cluster, 3);
        assert!(shaped.font.is_none());
    }

    #[test]
    fn baseline_is_centred_in_line_box() {
        let shaped = shape("x", None, 10.0);
        // content height 10, line box 14 -> 2px half-leading + 8px ascender
        assert!((shaped.baseline_in(14.0) - 10.0).abs() < 1e-4);
    }
}
