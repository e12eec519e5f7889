use std::fmt;

/// The status a trigger control renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportStatus {
    #[default]
    Idle,
    Generating,
    Success,
    Error,
}

impl ExportStatus {
    /// True while a new trigger would be rejected.
    pub fn is_busy(&self) -> bool {
        matches!(self, ExportStatus::Generating)
    }
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExportStatus::Idle => "idle",
            ExportStatus::Generating => "generating",
            ExportStatus::Success => "success",
            ExportStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// A transient user-facing message about a finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Saved { filename: String, pages: usize },
    Failed { message: String },
}

/// Renders notices. Rendering itself is up to the embedder.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice {
            Notice::Saved { filename, pages } => {
                log::info!("Saved {} ({} page(s))", filename, pages)
            }
            Notice::Failed { message } => log::error!("{}", message),
        }
    }
}
