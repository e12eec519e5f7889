#[cfg(feature = "system-fonts")]
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use vellum_layout::FontLibrary;
use vellum_raster::OriginPolicy;
use vellum_traits::{FontProvider, ResourceProvider};
use vellum_types::PageSize;

use super::controller::ExportController;
use super::status::{LogNotifier, Notifier};
use crate::capture::{Rasterizer, SkiaRasterizer};
use crate::config::ExportConfig;
use crate::delivery::{Delivery, MemoryDelivery};
use crate::error::ExportError;
use crate::stage::{OffscreenStage, StageHost};

/// A builder for creating an `ExportController`.
pub struct ExporterBuilder<R: Rasterizer = SkiaRasterizer> {
    config: ExportConfig,
    resources: Option<Arc<dyn ResourceProvider>>,
    fonts: FontLibrary,
    host: StageHost,
    delivery: Option<Arc<dyn Delivery>>,
    notifier: Arc<dyn Notifier>,
    rasterizer: R,
}

impl Default for ExporterBuilder {
    fn default() -> Self {
        Self {
            config: ExportConfig::default(),
            resources: None,
            fonts: FontLibrary::new(),
            host: StageHost::new(),
            delivery: None,
            notifier: Arc::new(LogNotifier),
            rasterizer: SkiaRasterizer,
        }
    }
}

impl ExporterBuilder {
    /// Creates a builder with default settings and the tiny-skia rasterizer.
    pub fn new() -> Self {
        Default::default()
    }
}

impl<R: Rasterizer> ExporterBuilder<R> {
    /// Replaces the whole configuration.
    pub fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.config.page_size = page_size;
        self
    }

    /// Device pixels per CSS pixel used for the capture.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.config.scale = scale;
        self
    }

    pub fn with_settle_timeout(mut self, timeout: Duration) -> Self {
        self.config.settle_timeout = timeout;
        self
    }

    /// Where image sources referenced by the content are loaded from.
    pub fn with_resource_provider(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.resources = Some(provider);
        self
    }

    /// Font bytes from this provider take precedence over discovered faces.
    pub fn with_font_provider(mut self, provider: Arc<dyn FontProvider>) -> Self {
        self.fonts = self.fonts.with_provider(provider);
        self
    }

    /// Scans a directory for font files and adds them to the font database.
    #[cfg(feature = "system-fonts")]
    pub fn with_font_dir<P: AsRef<Path>>(self, path: P) -> Self {
        self.fonts.add_font_dir(path);
        self
    }

    /// Scans the host system for installed fonts.
    #[cfg(feature = "system-fonts")]
    pub fn with_system_fonts(mut self, enable: bool) -> Self {
        self.fonts = self.fonts.with_system_fonts(enable);
        self
    }

    /// Shares a stage host, e.g. to observe attached stages from outside.
    pub fn with_stage_host(mut self, host: StageHost) -> Self {
        self.host = host;
        self
    }

    pub fn with_delivery(mut self, delivery: Arc<dyn Delivery>) -> Self {
        self.delivery = Some(delivery);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Swaps the capture implementation.
    pub fn with_rasterizer<R2: Rasterizer>(self, rasterizer: R2) -> ExporterBuilder<R2> {
        ExporterBuilder {
            config: self.config,
            resources: self.resources,
            fonts: self.fonts,
            host: self.host,
            delivery: self.delivery,
            notifier: self.notifier,
            rasterizer,
        }
    }

    /// Validates the configuration and creates the `ExportController`.
    ///
    /// Without a resource provider, image sources resolve to nothing and are
    /// rendered absent. Without a delivery, documents are kept in memory.
    pub fn build(self) -> Result<ExportController<R>, ExportError> {
        self.config.validate()?;

        let mut stage = OffscreenStage::new(self.host, self.config.settle_timeout)
            .with_fonts(self.fonts)
            .with_origin_policy(OriginPolicy::new(&self.config.trusted_hosts));
        if let Some(resources) = self.resources {
            log::debug!("Assets resolve through {}", resources.name());
            stage = stage.with_resources(resources);
        }

        let delivery = self.delivery.unwrap_or_else(|| {
            log::debug!("No delivery configured; keeping documents in memory");
            Arc::new(MemoryDelivery::new()) as Arc<dyn Delivery>
        });

        Ok(ExportController::new(
            self.config,
            stage,
            self.rasterizer,
            delivery,
            self.notifier,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_overrides() {
        let controller = ExporterBuilder::new()
            .with_page_size(PageSize::LETTER)
            .with_scale(1.0)
            .with_settle_timeout(Duration::from_millis(10))
            .build()
            .unwrap();
        assert_eq!(controller.config().page_size, PageSize::LETTER);
        assert_eq!(controller.config().scale, 1.0);
        assert_eq!(controller.config().settle_timeout, Duration::from_millis(10));
    }

    #[test]
    fn invalid_scale_fails_to_build() {
        let err = ExporterBuilder::new().with_scale(-1.0).build().unwrap_err();
        assert!(matches!(err, ExportError::Config(_)));
    }

    #[test]
    fn shared_host_is_observable() {
        let host = StageHost::new();
        let controller = ExporterBuilder::new()
            .with_stage_host(host.clone())
            .build()
            .unwrap();
        assert_eq!(controller.host().attached_count(), host.attached_count());
    }
}
