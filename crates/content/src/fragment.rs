//! Layout fragment: the styled node tree handed to the export stage.
//!
//! A fragment is plain data. It carries no positions; the stage lays it out at
//! a fixed width once its assets have settled. Two fragments built from the same
//! model compare equal and serialize to identical markup.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use vellum_types::{Color, FontStyle, FontWeight};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub const fn all(v: f32) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub const fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    fn as_css(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

/// Text styling. Sizes are CSS pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub family: String,
    pub size: f32,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub color: Color,
    /// Line box height as a multiple of `size`.
    pub line_height: f32,
    pub align: TextAlign,
}

impl TextStyle {
    pub fn line_box(&self) -> f32 {
        self.size * self.line_height
    }

    pub fn font_request(&self) -> FontRequest {
        FontRequest {
            family: self.family.clone(),
            weight: self.weight,
            style: self.style,
        }
    }

    fn css(&self) -> String {
        let mut css = format!(
            "font-family:{};font-size:{}px;font-weight:{};color:{};line-height:{}",
            self.family,
            self.size,
            self.weight.numeric_value(),
            self.color.to_hex(),
            self.line_height
        );
        if self.style == FontStyle::Italic {
            css.push_str(";font-style:italic");
        }
        if self.align != TextAlign::Left {
            let _ = write!(css, ";text-align:{}", self.align.as_css());
        }
        css
    }
}

/// Box styling for block containers. Sizes are CSS pixels.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoxStyle {
    pub padding: Edges,
    pub margin_bottom: f32,
    pub background: Option<Color>,
    /// Left accent bar: width and color.
    pub border_left: Option<(f32, Color)>,
}

impl BoxStyle {
    fn css(&self) -> String {
        let p = &self.padding;
        let mut css = format!(
            "padding:{}px {}px {}px {}px;margin-bottom:{}px",
            p.top, p.right, p.bottom, p.left, self.margin_bottom
        );
        if let Some(bg) = self.background {
            let _ = write!(css, ";background:{}", bg.to_hex());
        }
        if let Some((w, c)) = self.border_left {
            let _ = write!(css, ";border-left:{}px solid {}", w, c.to_hex());
        }
        css
    }
}

/// One font face the fragment needs before it can be painted faithfully.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontRequest {
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FragmentNode {
    /// Vertical stack of children inside a styled box.
    Block {
        class: String,
        style: BoxStyle,
        children: Vec<FragmentNode>,
    },
    /// A paragraph of wrapping text.
    Text {
        class: String,
        style: TextStyle,
        text: String,
    },
    /// Two texts sharing a line: `left` wraps, `right` is right-aligned and never wraps.
    SplitRow {
        class: String,
        left: String,
        left_style: TextStyle,
        right: String,
        right_style: TextStyle,
    },
    BulletList {
        class: String,
        style: TextStyle,
        items: Vec<String>,
    },
    Image {
        class: String,
        src: String,
        width: f32,
        height: f32,
    },
    Rule {
        thickness: f32,
        color: Color,
        margin: f32,
    },
    Spacer {
        height: f32,
    },
}

/// The complete styled document, top to bottom.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutFragment {
    pub nodes: Vec<FragmentNode>,
    pub background: Color,
    pub padding: Edges,
}

impl LayoutFragment {
    pub fn new(nodes: Vec<FragmentNode>, background: Color, padding: Edges) -> Self {
        Self {
            nodes,
            background,
            padding,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All text in document order, one entry per text-bearing node part.
    pub fn text_content(&self) -> Vec<String> {
        let mut out = Vec::new();
        walk(&self.nodes, &mut |node| match node {
            FragmentNode::Text { text, .. } => out.push(text.clone()),
            FragmentNode::SplitRow { left, right, .. } => {
                out.push(left.clone());
                out.push(right.clone());
            }
            FragmentNode::BulletList { items, .. } => out.extend(items.iter().cloned()),
            _ => {}
        });
        out
    }

    /// Image sources in first-use order, without duplicates.
    pub fn image_sources(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        walk(&self.nodes, &mut |node| {
            if let FragmentNode::Image { src, .. } = node
                && !out.contains(src)
            {
                out.push(src.clone());
            }
        });
        out
    }

    /// Font faces in first-use order, without duplicates.
    pub fn font_requests(&self) -> Vec<FontRequest> {
        let mut out: Vec<FontRequest> = Vec::new();
        let mut add = |style: &TextStyle| {
            let req = style.font_request();
            if !out.contains(&req) {
                out.push(req);
            }
        };
        walk(&self.nodes, &mut |node| match node {
            FragmentNode::Text { style, .. } | FragmentNode::BulletList { style, .. } => add(style),
            FragmentNode::SplitRow {
                left_style,
                right_style,
                ..
            } => {
                add(left_style);
                add(right_style);
            }
            _ => {}
        });
        out
    }

    /// Deterministic HTML-like serialization, used for debugging and equivalence checks.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        let p = &self.padding;
        let _ = writeln!(
            out,
            "<article style=\"background:{};padding:{}px {}px {}px {}px\">",
            self.background.to_hex(),
            p.top,
            p.right,
            p.bottom,
            p.left
        );
        for node in &self.nodes {
            write_markup(node, 1, &mut out);
        }
        out.push_str("</article>\n");
        out
    }
}

fn walk<'a>(nodes: &'a [FragmentNode], visit: &mut impl FnMut(&'a FragmentNode)) {
    for node in nodes {
        visit(node);
        if let FragmentNode::Block { children, .. } = node {
            walk(children, visit);
        }
    }
}

fn write_markup(node: &FragmentNode, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    match node {
        FragmentNode::Block {
            class,
            style,
            children,
        } => {
            let _ = writeln!(out, "{indent}<div class=\"{}\" style=\"{}\">", escape(class), style.css());
            for child in children {
                write_markup(child, depth + 1, out);
            }
            let _ = writeln!(out, "{indent}</div>");
        }
        FragmentNode::Text { class, style, text } => {
            let _ = writeln!(
                out,
                "{indent}<p class=\"{}\" style=\"{}\">{}</p>",
                escape(class),
                style.css(),
                escape(text)
            );
        }
        FragmentNode::SplitRow {
            class,
            left,
            left_style,
            right,
            right_style,
        } => {
            let _ = writeln!(
                out,
                "{indent}<div class=\"{}\"><span style=\"{}\">{}</span><span style=\"{};float:right\">{}</span></div>",
                escape(class),
                left_style.css(),
                escape(left),
                right_style.css(),
                escape(right)
            );
        }
        FragmentNode::BulletList { class, style, items } => {
            let _ = writeln!(out, "{indent}<ul class=\"{}\" style=\"{}\">", escape(class), style.css());
            for item in items {
                let _ = writeln!(out, "{indent}  <li>{}</li>", escape(item));
            }
            let _ = writeln!(out, "{indent}</ul>");
        }
        FragmentNode::Image {
            class,
            src,
            width,
            height,
        } => {
            let _ = writeln!(
                out,
                "{indent}<img class=\"{}\" src=\"{}\" width=\"{}\" height=\"{}\">",
                escape(class),
                escape(src),
                width,
                height
            );
        }
        FragmentNode::Rule {
            thickness,
            color,
            margin,
        } => {
            let _ = writeln!(
                out,
                "{indent}<hr style=\"border-top:{}px solid {};margin:{}px 0\">",
                thickness,
                color.to_hex(),
                margin
            );
        }
        FragmentNode::Spacer { height } => {
            let _ = writeln!(out, "{indent}<div style=\"height:{}px\"></div>", height);
        }
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
