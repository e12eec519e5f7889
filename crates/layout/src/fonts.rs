//! Font library for the export stage.
//!
//! `FontLibrary` resolves font faces for a style and caches the loaded binaries.
//!
//! ## Sources
//!
//! Resolution tries, in order:
//! - the injected `FontProvider`, when one is set
//! - the fontdb database (feature: `system-fonts`), which holds faces added
//!   from directories, raw data, or the host's installed fonts
//! - the bundled DejaVu Sans faces (feature: `embedded-fonts`), so text still
//!   paints when nothing else matches
//!
//! Resolution is blocking I/O; the stage calls it from a blocking task while
//! assets settle.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use vellum_traits::{FontError, FontProvider, FontQuery, SharedFontData};
use vellum_types::{FontStyle, FontWeight};

// DejaVu Sans, see assets/LICENSE-DejaVu.txt
#[cfg(feature = "embedded-fonts")]
mod embedded {
    pub static DEJAVU_SANS: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
    pub static DEJAVU_SANS_BOLD: &[u8] = include_bytes!("../assets/DejaVuSans-Bold.ttf");
    pub static DEJAVU_SANS_OBLIQUE: &[u8] = include_bytes!("../assets/DejaVuSans-Oblique.ttf");
}

/// A thread-safe handle to font data with rustybuzz Face creation.
pub struct FontInstance {
    pub data: SharedFontData,
}

impl std::fmt::Debug for FontInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontInstance")
            .field("data_len", &self.data.len())
            .finish()
    }
}

impl FontInstance {
    pub fn new(data: SharedFontData) -> Self {
        Self { data }
    }

    /// Creates a lightweight Face view over the font data.
    pub fn as_face(&self) -> Option<rustybuzz::Face<'_>> {
        rustybuzz::Face::from_slice(&self.data, 0)
    }
}

pub type FontData = Arc<FontInstance>;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct FontCacheKey {
    family: String,
    weight: u16,
    italic: bool,
}

impl FontCacheKey {
    fn new(query: &FontQuery) -> Self {
        Self {
            family: query.family.to_lowercase(),
            weight: query.weight.numeric_value(),
            italic: query.style == FontStyle::Italic,
        }
    }
}

#[derive(Clone)]
pub struct FontLibrary {
    #[cfg(feature = "system-fonts")]
    db: Arc<RwLock<fontdb::Database>>,

    provider: Option<Arc<dyn FontProvider>>,

    cache: Arc<RwLock<HashMap<FontCacheKey, FontData>>>,
}

impl std::fmt::Debug for FontLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontLibrary")
            .field("provider", &self.provider.as_ref().map(|p| p.name()))
            .field("cached_faces", &self.cached_count())
            .finish()
    }
}

impl Default for FontLibrary {
    fn default() -> Self {
        Self {
            #[cfg(feature = "system-fonts")]
            db: Arc::new(RwLock::new(fontdb::Database::new())),
            provider: None,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl FontLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_provider(provider: Arc<dyn FontProvider>) -> Self {
        Self::new().with_provider(provider)
    }

    /// Fonts from the provider take precedence over fontdb faces.
    pub fn with_provider(mut self, provider: Arc<dyn FontProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[cfg(feature = "system-fonts")]
    pub fn with_system_fonts(self, enable: bool) -> Self {
        if enable && let Ok(mut db) = self.db.write() {
            db.load_system_fonts();
            log::debug!("Loaded system fonts: {} faces", db.len());
        }
        self
    }

    #[cfg(feature = "system-fonts")]
    pub fn add_font_data(&self, data: Vec<u8>) {
        if let Ok(mut db) = self.db.write() {
            db.load_font_data(data);
        } else {
            log::warn!("Failed to acquire write lock on fontdb");
        }
    }

    #[cfg(feature = "system-fonts")]
    pub fn add_font_dir<P: AsRef<std::path::Path>>(&self, path: P) {
        let path = path.as_ref();
        if let Ok(mut db) = self.db.write() {
            let before = db.len();
            db.load_fonts_dir(path);
            log::debug!("Loaded {} faces from {}", db.len() - before, path.display());
        }
    }

    /// Number of faces loaded so far.
    pub fn cached_count(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or_default()
    }

    /// Resolves the font data for a family, weight and style.
    ///
    /// # Errors
    ///
    /// Returns `FontError::NotFound` if no source has a matching face and no
    /// bundled face is compiled in.
    pub fn resolve(&self, query: &FontQuery) -> Result<FontData, FontError> {
        let key = FontCacheKey::new(query);

        if let Ok(cache) = self.cache.read()
            && let Some(data) = cache.get(&key)
        {
            return Ok(data.clone());
        }

        log::debug!(
            "Resolving font: family='{}', weight={:?}, style={:?}",
            query.family,
            query.weight,
            query.style
        );

        let bytes = match self.load_from_sources(query) {
            Ok(bytes) => bytes,
            Err(e) => match bundled_face(query) {
                Some(bytes) => {
                    log::debug!("  → {}; using the bundled sans face", e);
                    bytes
                }
                None => return Err(e),
            },
        };

        let instance = Arc::new(FontInstance::new(bytes));
        if instance.as_face().is_none() {
            return Err(FontError::InvalidData(format!(
                "'{}' is not a parseable font face",
                query.family
            )));
        }

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, instance.clone());
        }
        Ok(instance)
    }

    fn load_from_sources(&self, query: &FontQuery) -> Result<SharedFontData, FontError> {
        match &self.provider {
            Some(provider) => match provider.load_font(query) {
                Ok(bytes) => Ok(bytes),
                Err(e) => {
                    log::debug!("  → Not found via {}: {}", provider.name(), e);
                    self.load_from_db(query)
                }
            },
            None => self.load_from_db(query),
        }
    }

    #[cfg(feature = "system-fonts")]
    fn load_from_db(&self, query: &FontQuery) -> Result<SharedFontData, FontError> {
        let not_found = || FontError::NotFound {
            family: query.family.clone(),
            weight: query.weight,
            style: query.style,
        };
        let poisoned = || FontError::LoadFailed {
            path: query.family.clone(),
            message: "fontdb lock poisoned".to_string(),
        };

        let db = self.db.read().map_err(|_| poisoned())?;
        let weight = map_weight(query.weight);
        let style = map_style(query.style);

        let id = db
            .query(&fontdb::Query {
                families: &[fontdb::Family::Name(&query.family), fontdb::Family::SansSerif],
                weight,
                stretch: fontdb::Stretch::Normal,
                style,
            })
            .or_else(|| {
                log::debug!("  → Primary query failed, trying any face");
                db.faces().next().map(|f| f.id)
            })
            .ok_or_else(not_found)?;

        let face = db.face(id).ok_or_else(not_found)?;
        log::debug!("  → Matched font: {:?} ({})", face.families, face.post_script_name);

        match &face.source {
            fontdb::Source::Binary(data) => Ok(Arc::new(data.as_ref().as_ref().to_vec())),
            fontdb::Source::File(path) => std::fs::read(path).map(Arc::new).map_err(|e| {
                FontError::LoadFailed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                }
            }),
            _ => Err(FontError::InvalidData(
                "unsupported font source type".to_string(),
            )),
        }
    }

    #[cfg(not(feature = "system-fonts"))]
    fn load_from_db(&self, query: &FontQuery) -> Result<SharedFontData, FontError> {
        Err(FontError::NotFound {
            family: query.family.clone(),
            weight: query.weight,
            style: query.style,
        })
    }
}

#[cfg(feature = "embedded-fonts")]
fn bundled_face(query: &FontQuery) -> Option<SharedFontData> {
    let bytes = if query.weight.is_bold() {
        embedded::DEJAVU_SANS_BOLD
    } else if query.style == FontStyle::Italic {
        embedded::DEJAVU_SANS_OBLIQUE
    } else {
        embedded::DEJAVU_SANS
    };
    Some(Arc::new(bytes.to_vec()))
}

#[cfg(not(feature = "embedded-fonts"))]
fn bundled_face(_query: &FontQuery) -> Option<SharedFontData> {
    None
}

#[cfg(feature = "system-fonts")]
fn map_weight(w: FontWeight) -> fontdb::Weight {
    match w {
        FontWeight::Light => fontdb::Weight::LIGHT,
        FontWeight::Regular => fontdb::Weight::NORMAL,
        FontWeight::Medium => fontdb::Weight::MEDIUM,
        FontWeight::Bold => fontdb::Weight::BOLD,
        FontWeight::Numeric(n) => fontdb::Weight(n),
    }
}

#[cfg(feature = "system-fonts")]
fn map_style(s: FontStyle) -> fontdb::Style {
    match s {
        FontStyle::Normal => fontdb::Style::Normal,
        FontStyle::Italic => fontdb::Style::Italic,
    }
}
