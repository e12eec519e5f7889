use lopdf::Document as LopdfDocument;

/// Pixel size `(width, height)` of the page image on every page, in page order.
pub fn page_image_sizes(doc: &LopdfDocument) -> Result<Vec<(i64, i64)>, lopdf::Error> {
    let mut sizes = Vec::new();
    for (_page_num, page_id) in doc.get_pages() {
        let page = doc.get_dictionary(page_id)?;
        let resources = page.get(b"Resources")?.as_dict()?;
        let xobjects = resources.get(b"XObject")?.as_dict()?;
        let image_id = xobjects.get(b"Im0")?.as_reference()?;
        let image = doc.get_object(image_id)?.as_stream()?;
        sizes.push((
            image.dict.get(b"Width")?.as_i64()?,
            image.dict.get(b"Height")?.as_i64()?,
        ));
    }
    Ok(sizes)
}

/// Text string of an entry in the document info dictionary.
pub fn info_string(doc: &LopdfDocument, key: &[u8]) -> Option<String> {
    let info_id = doc.trailer.get(b"Info").ok()?.as_reference().ok()?;
    let info = doc.get_dictionary(info_id).ok()?;
    lopdf::decode_text_string(info.get(key).ok()?).ok()
}

/// Assert the number of pages in a PDF
#[macro_export]
macro_rules! assert_pdf_page_count {
    ($pdf:expr, $count:expr) => {
        assert_eq!(
            $pdf.page_count(),
            $count,
            "Expected {} pages, got {}",
            $count,
            $pdf.page_count()
        );
    };
}
