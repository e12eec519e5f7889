//! vellum: export a resume content model to a paginated PDF.
//!
//! The content is built into a fragment, laid out on an off-screen stage at a
//! fixed width, captured into one tall raster and cut into page-height slices,
//! each of which becomes one full-bleed page.
//!
//! ```no_run
//! use std::sync::Arc;
//! use vellum::{ContentModel, DirectoryDelivery, ExporterBuilder};
//!
//! # async fn run() -> Result<(), vellum::ExportError> {
//! let model = ContentModel::from_file("resume.json")?;
//! let exporter = ExporterBuilder::new()
//!     .with_delivery(Arc::new(DirectoryDelivery::new("out")))
//!     .build()?;
//! exporter.export(&model).await?;
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod delivery;
pub mod error;
pub mod export;
pub mod paginate;
pub mod stage;

pub use capture::{Rasterizer, SkiaRasterizer};
pub use config::ExportConfig;
pub use delivery::{
    DeliveredFile, Delivery, DeliveryError, DirectoryDelivery, MemoryDelivery, document_filename,
};
pub use error::ExportError;
pub use export::{
    ExportController, ExportOutcome, ExportReceipt, ExportStatus, ExporterBuilder, LogNotifier,
    Notice, Notifier,
};
pub use paginate::{PaginationError, page_bands, paginate};
pub use stage::{OffscreenStage, SettleReport, StageError, StageHandle, StageHost};

pub use vellum_content::{ContentModel, ContentModelBuilder, LayoutFragment, Theme};
pub use vellum_pdf_composer::{DocumentAssembler, DocumentMetadata, ExportDocument};
pub use vellum_raster::{PageSlice, Raster, RasterError};
pub use vellum_resource::FilesystemResourceProvider;
pub use vellum_types::PageSize;
