//! Block flow layout of a fragment at a fixed width.
//!
//! Nodes stack vertically; there is no page height here. The pass is pure given
//! the settled assets: the same fragment and assets always produce the same list.

use std::collections::HashMap;

use vellum_content::{BoxStyle, FontRequest, FragmentNode, LayoutFragment, TextAlign, TextStyle};
use vellum_traits::SharedResourceData;
use vellum_types::Rect;

use crate::display::{DisplayItem, DisplayList, PlacedGlyph, TextRun};
use crate::fonts::FontData;
use crate::text::{break_lines, shape, ShapedText};
use crate::LayoutError;

const SPLIT_ROW_GAP: f32 = 12.0;
const BULLET_INDENT: f32 = 18.0;

/// Fonts and images that finished loading before the stage was laid out.
#[derive(Debug, Clone, Default)]
pub struct SettledAssets {
    fonts: HashMap<FontRequest, FontData>,
    images: HashMap<String, SharedResourceData>,
}

impl SettledAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_font(&mut self, request: FontRequest, font: FontData) {
        self.fonts.insert(request, font);
    }

    pub fn insert_image(&mut self, src: impl Into<String>, data: SharedResourceData) {
        self.images.insert(src.into(), data);
    }

    pub fn font(&self, request: &FontRequest) -> Option<&FontData> {
        self.fonts.get(request)
    }

    pub fn image(&self, src: &str) -> Option<&SharedResourceData> {
        self.images.get(src)
    }

    pub fn font_count(&self) -> usize {
        self.fonts.len()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

pub struct LayoutEngine<'a> {
    assets: &'a SettledAssets,
}

impl<'a> LayoutEngine<'a> {
    pub fn new(assets: &'a SettledAssets) -> Self {
        Self { assets }
    }

    pub fn layout(&self, fragment: &LayoutFragment, width: f32) -> Result<DisplayList, LayoutError> {
        let content_width = width - fragment.padding.horizontal();
        if !width.is_finite() || content_width <= 0.0 {
            return Err(LayoutError::InvalidWidth {
                width,
                padding: fragment.padding.horizontal(),
            });
        }

        let mut items = Vec::new();
        let bottom = self.layout_nodes(
            &fragment.nodes,
            fragment.padding.left,
            fragment.padding.top,
            content_width,
            &mut items,
        );
        let height = (bottom + fragment.padding.bottom).ceil();

        log::debug!(
            "Laid out {} display items over {}x{} css px",
            items.len(),
            width,
            height
        );
        Ok(DisplayList {
            width,
            height,
            background: fragment.background,
            items,
        })
    }

    /// Lays out `nodes` in a column starting at `y`; returns the y below the last node.
    fn layout_nodes(
        &self,
        nodes: &[FragmentNode],
        x: f32,
        mut y: f32,
        width: f32,
        out: &mut Vec<DisplayItem>,
    ) -> f32 {
        for node in nodes {
            y = self.layout_node(node, x, y, width, out);
        }
        y
    }

    fn layout_node(
        &self,
        node: &FragmentNode,
        x: f32,
        y: f32,
        width: f32,
        out: &mut Vec<DisplayItem>,
    ) -> f32 {
        match node {
            FragmentNode::Block {
                style, children, ..
            } => self.layout_block(style, children, x, y, width, out),
            FragmentNode::Text { style, text, .. } => self.layout_paragraph(text, style, x, y, width, out),
            FragmentNode::SplitRow {
                left,
                left_style,
                right,
                right_style,
                ..
            } => self.layout_split_row(left, left_style, right, right_style, x, y, width, out),
            FragmentNode::BulletList { style, items, .. } => {
                let mut y = y;
                for item in items {
                    let line_box = style.line_box();
                    let dot = (style.size * 0.3).max(2.0);
                    out.push(DisplayItem::Fill {
                        rect: Rect::new(x + 4.0, y + (line_box - dot) / 2.0, dot, dot),
                        color: style.color,
                    });
                    y = self.layout_paragraph(
                        item,
                        style,
                        x + BULLET_INDENT,
                        y,
                        (width - BULLET_INDENT).max(1.0),
                        out,
                    );
                }
                y
            }
            FragmentNode::Image {
                src,
                width: w,
                height: h,
                ..
            } => {
                // Oversized images shrink to the column, keeping their aspect ratio.
                let (w, h) = if *w > width { (width, h * width / w) } else { (*w, *h) };
                out.push(DisplayItem::Image {
                    rect: Rect::new(x, y, w, h),
                    src: src.clone(),
                    data: self.assets.image(src).cloned(),
                });
                y + h
            }
            FragmentNode::Rule {
                thickness,
                color,
                margin,
            } => {
                out.push(DisplayItem::Fill {
                    rect: Rect::new(x, y + margin, width, *thickness),
                    color: *color,
                });
                y + margin * 2.0 + thickness
            }
            FragmentNode::Spacer { height } => y + height,
        }
    }

    fn layout_block(
        &self,
        style: &BoxStyle,
        children: &[FragmentNode],
        x: f32,
        y: f32,
        width: f32,
        out: &mut Vec<DisplayItem>,
    ) -> f32 {
        let border = style.border_left.map(|(w, _)| w).unwrap_or(0.0);
        let inner_x = x + border + style.padding.left;
        let inner_width = (width - border - style.padding.horizontal()).max(1.0);

        // Decorations go under the children, so lay children out first.
        let mut body = Vec::new();
        let content_bottom =
            self.layout_nodes(children, inner_x, y + style.padding.top, inner_width, &mut body);
        let box_height = content_bottom + style.padding.bottom - y;

        if let Some(color) = style.background {
            out.push(DisplayItem::Fill {
                rect: Rect::new(x, y, width, box_height),
                color,
            });
        }
        if let Some((w, color)) = style.border_left {
            out.push(DisplayItem::Fill {
                rect: Rect::new(x, y, w, box_height),
                color,
            });
        }
        out.append(&mut body);
        y + box_height + style.margin_bottom
    }

    fn layout_paragraph(
        &self,
        text: &str,
        style: &TextStyle,
        x: f32,
        y: f32,
        width: f32,
        out: &mut Vec<DisplayItem>,
    ) -> f32 {
        let shaped = self.shape(text, style);
        let line_box = style.line_box();
        let baseline = shaped.baseline_in(line_box);
        let mut y = y;

        for line in break_lines(&shaped, text, width) {
            let offset = match style.align {
                TextAlign::Left => 0.0,
                TextAlign::Center => (width - line.width) / 2.0,
                TextAlign::Right => width - line.width,
            };
            out.push(DisplayItem::Text(text_run(
                &shaped,
                text,
                line.start..line.end,
                x + offset.max(0.0),
                y + baseline,
                style,
            )));
            y += line_box;
        }
        y
    }

    #[allow(clippy::too_many_arguments)]
    fn layout_split_row(
        &self,
        left: &str,
        left_style: &TextStyle,
        right: &str,
        right_style: &TextStyle,
        x: f32,
        y: f32,
        width: f32,
        out: &mut Vec<DisplayItem>,
    ) -> f32 {
        if right.is_empty() {
            return self.layout_paragraph(left, left_style, x, y, width, out);
        }

        let right_shaped = self.shape(right, right_style);
        let right_width = right_shaped.width.min(width);
        let left_width = width - right_width - SPLIT_ROW_GAP;
        let left_width = if left_width > 0.0 { left_width } else { width };

        let left_bottom = self.layout_paragraph(left, left_style, x, y, left_width, out);

        // The right side shares the first line's baseline.
        let first_line = left_style.line_box().max(right_style.line_box());
        let left_first = self.shape(left, left_style).baseline_in(first_line);
        let right_baseline = right_shaped.baseline_in(first_line).max(left_first);
        out.push(DisplayItem::Text(text_run(
            &right_shaped,
            right,
            0..right_shaped.glyphs.len(),
            x + width - right_width,
            y + right_baseline,
            right_style,
        )));

        left_bottom.max(y + right_style.line_box())
    }

    fn shape(&self, text: &str, style: &TextStyle) -> ShapedText {
        let font = self.assets.font(&style.font_request());
        shape(text, font, style.size)
    }
}

fn text_run(
    shaped: &ShapedText,
    text: &str,
    glyphs: std::ops::Range<usize>,
    x: f32,
    baseline: f32,
    style: &TextStyle,
) -> TextRun {
    let slice = &shaped.glyphs[glyphs.clone()];
    let mut pen = 0.0;
    let placed = slice
        .iter()
        .map(|g| {
            let glyph = PlacedGlyph {
                id: g.id,
                x: pen + g.x_offset,
                y: -g.y_offset,
            };
            pen += g.x_advance;
            glyph
        })
        .collect();

    let byte_range = match (slice.first(), shaped.glyphs.get(glyphs.end)) {
        (Some(first), Some(next)) => first.cluster..next.cluster,
        (Some(first), None) => first.cluster..text.len(),
        (None, _) => 0..0,
    };
    TextRun {
        x,
        baseline,
        size: style.size,
        color: style.color,
        width: pen,
        font: shaped.font.clone(),
        glyphs: placed,
        text: text
            .get(byte_range)
            .unwrap_or_default()
            .trim_end()
            .to_string(),
    }
}
