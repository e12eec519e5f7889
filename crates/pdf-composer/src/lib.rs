//! Document assembly for rasterized exports.
//!
//! Each [`PageSlice`] becomes exactly one PDF page holding one JPEG image
//! XObject. The image spans the full page width and is anchored to the top of
//! the page, so a short final slice keeps its proportions instead of stretching.

mod error;

pub use error::ComposerError;

use image::ExtendedColorType;
use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use vellum_raster::PageSlice;
use vellum_types::PageSize;

pub const DEFAULT_JPEG_QUALITY: u8 = 92;
const CREATOR: &str = "vellum";

/// Info dictionary entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
}

impl DocumentMetadata {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    page_size: PageSize,
    jpeg_quality: u8,
}

impl DocumentAssembler {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_size,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Clamped to 1..=100.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Builds one page per slice, in slice order.
    pub fn assemble(
        &self,
        slices: &[PageSlice<'_>],
        metadata: DocumentMetadata,
    ) -> Result<ExportDocument, ComposerError> {
        if slices.is_empty() {
            return Err(ComposerError::EmptyDocument);
        }

        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let mut kids = Vec::with_capacity(slices.len());

        for slice in slices {
            let page_id = self.add_page(&mut doc, pages_id, slice)?;
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let info_id = doc.add_object(info_dictionary(&metadata));
        doc.trailer.set("Info", info_id);

        log::info!("Assembled document with {} page(s)", count);
        Ok(ExportDocument {
            doc,
            page_count: count,
            page_size: self.page_size,
            metadata,
        })
    }

    fn add_page(
        &self,
        doc: &mut Document,
        pages_id: ObjectId,
        slice: &PageSlice<'_>,
    ) -> Result<ObjectId, ComposerError> {
        let (width, height) = (slice.width(), slice.height());

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality).encode(
            &slice.to_rgb(),
            width,
            height,
            ExtendedColorType::Rgb8,
        )?;

        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            jpeg,
        )
        .with_compression(false);
        let image_id = doc.add_object(image);

        let page_w = self.page_size.width_pt;
        let page_h = self.page_size.height_pt;
        let drawn_h = (page_w * height as f32 / width.max(1) as f32).min(page_h);
        let top = page_h - drawn_h;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        page_w.into(),
                        0.0.into(),
                        0.0.into(),
                        drawn_h.into(),
                        0.0.into(),
                        top.into(),
                    ],
                ),
                Operation::new("Do", vec!["Im0".into()]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.0.into(), 0.0.into(), page_w.into(), page_h.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        log::debug!(
            "Page {}: rows [{}, {}) drawn {:.1}pt tall",
            slice.index() + 1,
            slice.y_offset(),
            slice.end(),
            drawn_h
        );
        Ok(page_id)
    }
}

fn info_dictionary(metadata: &DocumentMetadata) -> lopdf::Dictionary {
    let created = chrono::Utc::now().format("D:%Y%m%d%H%M%SZ").to_string();
    dictionary! {
        // Non-ASCII names need UTF-16BE with a BOM to read back intact.
        "Title" => lopdf::text_string(&metadata.title),
        "Author" => lopdf::text_string(&metadata.author),
        "Creator" => Object::string_literal(CREATOR),
        "Producer" => Object::string_literal(CREATOR),
        "CreationDate" => Object::string_literal(created),
    }
}

/// The assembled document. Immutable; consumed by [`ExportDocument::into_bytes`].
pub struct ExportDocument {
    doc: Document,
    page_count: usize,
    page_size: PageSize,
    metadata: DocumentMetadata,
}

impl std::fmt::Debug for ExportDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportDocument")
            .field("page_count", &self.page_count)
            .field("page_size", &self.page_size)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl ExportDocument {
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn page_size(&self) -> PageSize {
        self.page_size
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn into_bytes(mut self) -> Result<Vec<u8>, ComposerError> {
        let mut out = Vec::new();
        self.doc.save_to(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_raster::Raster;
    use vellum_types::Color;

    fn slices(raster: &Raster, page_h: u32) -> Vec<PageSlice<'_>> {
        let mut out = Vec::new();
        let mut y = 0;
        while y < raster.height() {
            let h = page_h.min(raster.height() - y);
            out.push(raster.slice(out.len(), y, h).unwrap());
            y += h;
        }
        out
    }

    #[test]
    fn one_page_per_slice() {
        let raster = Raster::filled(60, 250, 1.0, Color::gray(200)).unwrap();
        let doc = DocumentAssembler::new(PageSize::A4)
            .assemble(&slices(&raster, 100), DocumentMetadata::new("Test Resume", "Test"))
            .unwrap();
        assert_eq!(doc.page_count(), 3);

        let bytes = doc.into_bytes().unwrap();
        let loaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(loaded.get_pages().len(), 3);
    }

    #[test]
    fn every_page_has_the_physical_page_size() {
        let raster = Raster::filled(10, 30, 1.0, Color::WHITE).unwrap();
        let bytes = DocumentAssembler::new(PageSize::LETTER)
            .assemble(&slices(&raster, 20), DocumentMetadata::default())
            .unwrap()
            .into_bytes()
            .unwrap();
        let loaded = Document::load_mem(&bytes).unwrap();
        for (_, page_id) in loaded.get_pages() {
            let page = loaded.get_dictionary(page_id).unwrap();
            let media = page.get(b"MediaBox").unwrap().as_array().unwrap();
            assert_eq!(media[2].as_float().unwrap(), 612.0);
            assert_eq!(media[3].as_float().unwrap(), 792.0);
        }
    }

    #[test]
    fn empty_input_is_rejected() {
        let err = DocumentAssembler::new(PageSize::A4)
            .assemble(&[], DocumentMetadata::default())
            .unwrap_err();
        assert!(matches!(err, ComposerError::EmptyDocument));
    }

    #[test]
    fn non_ascii_names_are_utf16_text_strings() {
        let metadata = DocumentMetadata::new("Chiamaka Ọkafọ Resume", "Chiamaka Ọkafọ");
        let info = info_dictionary(&metadata);
        let author = info.get(b"Author").unwrap();
        assert!(author.as_str().unwrap().starts_with(b"\xFE\xFF"));
        assert_eq!(lopdf::decode_text_string(author).unwrap(), "Chiamaka Ọkafọ");

        let plain = info_dictionary(&DocumentMetadata::new("Amara Okafor Resume", "Amara Okafor"));
        assert_eq!(plain.get(b"Author").unwrap().as_str().unwrap(), b"Amara Okafor");
    }

    #[test]
    fn info_dictionary_names_the_creator() {
        let info = info_dictionary(&DocumentMetadata::new("Amara Okafor Resume", "Amara Okafor"));
        let creator = info.get(b"Creator").unwrap().as_str().unwrap();
        assert_eq!(creator, b"vellum");
        assert!(info.get(b"CreationDate").is_ok());
    }
}
