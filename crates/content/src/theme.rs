use serde::Deserialize;
use vellum_types::{Color, FontStyle, FontWeight};

use crate::fragment::{Edges, TextAlign, TextStyle};

/// Visual parameters the builder applies uniformly to every section.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Theme {
    pub font_family: String,
    pub heading_family: String,
    pub base_size: f32,
    pub line_height: f32,
    pub text_color: Color,
    pub muted_color: Color,
    pub accent_color: Color,
    pub background: Color,
    pub page_padding: Edges,
    pub section_gap: f32,
    pub entry_gap: f32,
    pub avatar_size: f32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            font_family: "Helvetica".to_string(),
            heading_family: "Helvetica".to_string(),
            base_size: 14.0,
            line_height: 1.5,
            text_color: Color::rgb(0x1f, 0x29, 0x37),
            muted_color: Color::rgb(0x6b, 0x72, 0x80),
            accent_color: Color::rgb(0x25, 0x63, 0xeb),
            background: Color::WHITE,
            page_padding: Edges::all(48.0),
            section_gap: 24.0,
            entry_gap: 16.0,
            avatar_size: 96.0,
        }
    }
}

impl Theme {
    pub fn body(&self) -> TextStyle {
        TextStyle {
            family: self.font_family.clone(),
            size: self.base_size,
            weight: FontWeight::Regular,
            style: FontStyle::Normal,
            color: self.text_color,
            line_height: self.line_height,
            align: TextAlign::Left,
        }
    }

    pub fn name(&self) -> TextStyle {
        TextStyle {
            family: self.heading_family.clone(),
            size: self.base_size * 2.25,
            weight: FontWeight::Bold,
            line_height: 1.2,
            ..self.body()
        }
    }

    pub fn headline(&self) -> TextStyle {
        TextStyle {
            size: self.base_size * 1.3,
            color: self.accent_color,
            ..self.body()
        }
    }

    pub fn section_title(&self) -> TextStyle {
        TextStyle {
            family: self.heading_family.clone(),
            size: self.base_size * 1.4,
            weight: FontWeight::Bold,
            line_height: 1.3,
            ..self.body()
        }
    }

    pub fn entry_title(&self) -> TextStyle {
        TextStyle {
            weight: FontWeight::Bold,
            size: self.base_size * 1.1,
            ..self.body()
        }
    }

    pub fn muted(&self) -> TextStyle {
        TextStyle {
            size: self.base_size * 0.9,
            color: self.muted_color,
            ..self.body()
        }
    }

    pub fn dates(&self) -> TextStyle {
        TextStyle {
            align: TextAlign::Right,
            ..self.muted()
        }
    }

    pub fn emphasis(&self) -> TextStyle {
        TextStyle {
            weight: FontWeight::Medium,
            color: self.accent_color,
            ..self.body()
        }
    }

    pub fn italic_muted(&self) -> TextStyle {
        TextStyle {
            style: FontStyle::Italic,
            ..self.muted()
        }
    }
}
