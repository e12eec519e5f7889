use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposerError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Failed to encode page image: {0}")]
    Encode(#[from] image::ImageError),

    #[error("I/O error while writing document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot assemble a document with no pages")]
    EmptyDocument,
}
