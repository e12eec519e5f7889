use thiserror::Error;
use vellum_content::ContentError;
use vellum_pdf_composer::ComposerError;
use vellum_raster::RasterError;

use crate::delivery::DeliveryError;
use crate::paginate::PaginationError;
use crate::stage::StageError;

/// Every way an export can fail, from loading input to delivering the file.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Content could not be loaded: {0}")]
    Content(#[from] ContentError),

    #[error("Stage failed: {0}")]
    Stage(#[from] StageError),

    #[error("Rasterization failed: {0}")]
    Raster(#[from] RasterError),

    #[error("Pagination failed: {0}")]
    Pagination(#[from] PaginationError),

    #[error("Document assembly failed: {0}")]
    Compose(#[from] ComposerError),

    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Configuration is invalid: {0}")]
    Config(String),

    #[error("Configuration JSON is invalid: {0}")]
    ConfigJson(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for ExportError {
    fn from(e: tokio::task::JoinError) -> Self {
        ExportError::Task(e.to_string())
    }
}
