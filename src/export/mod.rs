//! The export controller and its status surface.

mod builder;
mod controller;
mod status;

pub use builder::ExporterBuilder;
pub use controller::{ExportController, ExportOutcome, ExportReceipt};
pub use status::{ExportStatus, LogNotifier, Notice, Notifier};
