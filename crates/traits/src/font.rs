//! FontProvider trait for supplying font binaries without system font access.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use vellum_types::{FontStyle, FontWeight};

#[derive(Error, Debug, Clone)]
pub enum FontError {
    #[error("Font not found: {family} (weight {weight:?}, style {style:?})")]
    NotFound {
        family: String,
        weight: FontWeight,
        style: FontStyle,
    },

    #[error("Failed to load font '{path}': {message}")]
    LoadFailed { path: String, message: String },

    #[error("Invalid font data: {0}")]
    InvalidData(String),
}

pub type SharedFontData = Arc<Vec<u8>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FontQuery {
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
}

impl FontQuery {
    pub fn new(family: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            weight: FontWeight::Regular,
            style: FontStyle::Normal,
        }
    }

    pub fn with_weight(mut self, weight: FontWeight) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }
}

pub trait FontProvider: Send + Sync {
    fn load_font(&self, query: &FontQuery) -> Result<SharedFontData, FontError>;

    fn name(&self) -> &'static str;
}

/// Fonts registered ahead of time, keyed by lowercase family, weight and style.
///
/// Weight matching is exact first, then falls back to any face of the family
/// that agrees on boldness.
#[derive(Default)]
pub struct InMemoryFontProvider {
    faces: RwLock<HashMap<(String, u16, FontStyle), SharedFontData>>,
}

impl InMemoryFontProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_font(
        &self,
        family: &str,
        weight: FontWeight,
        style: FontStyle,
        data: Vec<u8>,
    ) -> Result<(), FontError> {
        let mut faces = self.faces.write().map_err(|_| FontError::LoadFailed {
            path: family.to_string(),
            message: "font store lock poisoned".to_string(),
        })?;
        faces.insert(
            (family.to_lowercase(), weight.numeric_value(), style),
            Arc::new(data),
        );
        Ok(())
    }
}

impl FontProvider for InMemoryFontProvider {
    fn load_font(&self, query: &FontQuery) -> Result<SharedFontData, FontError> {
        let faces = self.faces.read().map_err(|_| FontError::LoadFailed {
            path: query.family.clone(),
            message: "font store lock poisoned".to_string(),
        })?;
        let family = query.family.to_lowercase();

        if let Some(data) = faces.get(&(family.clone(), query.weight.numeric_value(), query.style)) {
            return Ok(data.clone());
        }

        let wants_bold = query.weight.is_bold();
        faces
            .iter()
            .find(|((f, w, s), _)| {
                *f == family && *s == query.style && (*w >= 600) == wants_bold
            })
            .map(|(_, data)| data.clone())
            .ok_or_else(|| FontError::NotFound {
                family: query.family.clone(),
                weight: query.weight,
                style: query.style,
            })
    }

    fn name(&self) -> &'static str {
        "InMemoryFontProvider"
    }
}
