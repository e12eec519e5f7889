use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;
use vellum_content::{ContentModel, ContentModelBuilder};
use vellum_pdf_composer::{DocumentAssembler, DocumentMetadata};
use vellum_raster::Raster;

use super::status::{ExportStatus, Notice, Notifier};
use crate::capture::{Rasterizer, SkiaRasterizer};
use crate::config::ExportConfig;
use crate::delivery::{Delivery, document_filename};
use crate::error::ExportError;
use crate::paginate::{page_height_px, paginate};
use crate::stage::{OffscreenStage, StageHandle, StageHost};

const FAILURE_PREFIX: &str = "document generation failed";

/// What one finished export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    pub filename: String,
    pub pages: usize,
    pub bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Delivered(ExportReceipt),
    /// Another export was generating; nothing was done.
    AlreadyRunning,
}

/// Runs exports one at a time and publishes their status.
///
/// `Idle -> Generating -> Success | Error -> Idle`. A trigger while
/// `Generating` is ignored. `Success` returns to `Idle` after the configured
/// display window, `Error` immediately. The stage is always detached before
/// `Error` is published.
pub struct ExportController<R: Rasterizer = SkiaRasterizer> {
    config: ExportConfig,
    builder: ContentModelBuilder,
    stage: OffscreenStage,
    rasterizer: R,
    assembler: DocumentAssembler,
    delivery: Arc<dyn Delivery>,
    notifier: Arc<dyn Notifier>,
    status: Arc<watch::Sender<ExportStatus>>,
    epoch: Arc<AtomicU64>,
}

impl<R: Rasterizer> std::fmt::Debug for ExportController<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportController")
            .field("config", &self.config)
            .field("stage", &self.stage)
            .field("status", &self.status())
            .finish()
    }
}

impl<R: Rasterizer> ExportController<R> {
    pub(crate) fn new(
        config: ExportConfig,
        stage: OffscreenStage,
        rasterizer: R,
        delivery: Arc<dyn Delivery>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let builder = ContentModelBuilder::new(config.theme.clone());
        let assembler =
            DocumentAssembler::new(config.page_size).with_jpeg_quality(config.jpeg_quality);
        let (status, _) = watch::channel(ExportStatus::Idle);
        Self {
            config,
            builder,
            stage,
            rasterizer,
            assembler,
            delivery,
            notifier,
            status: Arc::new(status),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn status(&self) -> ExportStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ExportStatus> {
        self.status.subscribe()
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn host(&self) -> &StageHost {
        self.stage.host()
    }

    /// Runs one export of `model` to completion.
    ///
    /// Returns [`ExportOutcome::AlreadyRunning`] without side effects while
    /// another export is generating. Failures are logged, notified and
    /// returned after the status has gone back to `Idle`.
    pub async fn export(&self, model: &ContentModel) -> Result<ExportOutcome, ExportError> {
        let Some(epoch) = self.begin() else {
            log::info!("Export already generating; trigger ignored");
            return Ok(ExportOutcome::AlreadyRunning);
        };

        let mut guard = InterruptGuard {
            status: &self.status,
            notifier: self.notifier.as_ref(),
            armed: true,
        };
        let result = self.run(model).await;
        guard.armed = false;

        match result {
            Ok(receipt) => {
                self.publish(ExportStatus::Success);
                self.notifier.notify(Notice::Saved {
                    filename: receipt.filename.clone(),
                    pages: receipt.pages,
                });
                self.schedule_reset(epoch);
                Ok(ExportOutcome::Delivered(receipt))
            }
            Err(e) => {
                let message = format!("{}: {}", FAILURE_PREFIX, e);
                log::error!("{}", message);
                self.publish(ExportStatus::Error);
                self.notifier.notify(Notice::Failed { message });
                self.publish(ExportStatus::Idle);
                Err(e)
            }
        }
    }

    /// Moves to `Generating` unless already there. Returns the new epoch.
    fn begin(&self) -> Option<u64> {
        let mut epoch = None;
        self.status.send_if_modified(|status| {
            if status.is_busy() {
                return false;
            }
            *status = ExportStatus::Generating;
            epoch = Some(self.epoch.fetch_add(1, Ordering::SeqCst) + 1);
            true
        });
        if epoch.is_some() {
            log::info!("Export status: {}", ExportStatus::Generating);
        }
        epoch
    }

    fn publish(&self, next: ExportStatus) {
        publish(&self.status, next);
    }

    /// Returns `Success` to `Idle` after the display window, unless a newer
    /// export has started in the meantime.
    fn schedule_reset(&self, epoch: u64) {
        let status = Arc::clone(&self.status);
        let current = Arc::clone(&self.epoch);
        let reset = move || {
            let changed = status.send_if_modified(|s| {
                if *s == ExportStatus::Success && current.load(Ordering::SeqCst) == epoch {
                    *s = ExportStatus::Idle;
                    true
                } else {
                    false
                }
            });
            if changed {
                log::info!("Export status: {}", ExportStatus::Idle);
            }
        };

        let window = self.config.success_display;
        if window.is_zero() {
            reset();
        } else {
            tokio::spawn(async move {
                tokio::time::sleep(window).await;
                reset();
            });
        }
    }

    async fn run(&self, model: &ContentModel) -> Result<ExportReceipt, ExportError> {
        let fragment = self.builder.build(model);
        let mut stage = self.stage.open(fragment, self.config.stage_width_px)?;
        let captured = self.capture(&mut stage).await;
        stage.close();
        let raster = captured?;

        let person = model.person_name().to_string();
        let filename = document_filename(&person);
        let metadata = DocumentMetadata::new(self.config.title_for(&person), person);
        let (pages, bytes) = self.assemble(raster, metadata).await?;

        let size = bytes.len();
        let delivery = Arc::clone(&self.delivery);
        let name = filename.clone();
        tokio::task::spawn_blocking(move || delivery.deliver(bytes, &name)).await??;
        log::info!("Delivered {} ({} page(s), {} bytes)", filename, pages, size);

        Ok(ExportReceipt {
            filename,
            pages,
            bytes: size,
        })
    }

    async fn capture(&self, stage: &mut StageHandle) -> Result<Raster, ExportError> {
        let report = self.stage.settle(stage).await?;
        if !report.is_complete() {
            log::warn!(
                "Capturing with {} missing and {} late asset(s)",
                report.failed.len(),
                report.timed_out.len()
            );
        }
        let raster = self.rasterizer.capture(stage, self.config.scale).await?;
        log::debug!("Raster {}x{} at scale {}", raster.width(), raster.height(), raster.scale());
        Ok(raster)
    }

    /// Paginates and assembles on a blocking thread. The raster is dropped there.
    async fn assemble(
        &self,
        raster: Raster,
        metadata: DocumentMetadata,
    ) -> Result<(usize, Vec<u8>), ExportError> {
        let assembler = self.assembler.clone();
        tokio::task::spawn_blocking(move || -> Result<(usize, Vec<u8>), ExportError> {
            let page_height = page_height_px(&assembler.page_size(), &raster);
            let slices = paginate(&raster, page_height)?;
            let document = assembler.assemble(&slices, metadata)?;
            let pages = document.page_count();
            log::info!("Document has {} page(s)", pages);
            Ok((pages, document.into_bytes()?))
        })
        .await?
    }
}

fn publish(status: &watch::Sender<ExportStatus>, next: ExportStatus) {
    status.send_replace(next);
    log::info!("Export status: {}", next);
}

/// Leaves `Generating` when an export future is dropped or unwinds before
/// `run` returns. The stage guard inside `run` has already detached by then.
struct InterruptGuard<'a> {
    status: &'a watch::Sender<ExportStatus>,
    notifier: &'a dyn Notifier,
    armed: bool,
}

impl Drop for InterruptGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let message = format!("{}: export was interrupted", FAILURE_PREFIX);
        log::error!("{}", message);
        publish(self.status, ExportStatus::Error);
        if !std::thread::panicking() {
            self.notifier.notify(Notice::Failed { message });
        }
        publish(self.status, ExportStatus::Idle);
    }
}
