//! Capturing a settled stage into a [`Raster`].

use std::future::Future;

use vellum_raster::{Raster, RasterError};

use crate::stage::StageHandle;

/// Captures the stage subtree into one bitmap at a fixed device scale.
///
/// A failed capture returns no raster at all.
pub trait Rasterizer: Send + Sync {
    fn capture(
        &self,
        stage: &StageHandle,
        scale: f32,
    ) -> impl Future<Output = Result<Raster, RasterError>> + Send;
}

/// Paints the stage's display list with tiny-skia on a blocking thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkiaRasterizer;

impl Rasterizer for SkiaRasterizer {
    async fn capture(&self, stage: &StageHandle, scale: f32) -> Result<Raster, RasterError> {
        let list = stage.display_list().cloned().ok_or(RasterError::NotSettled)?;
        let policy = stage.origin_policy().clone();

        let raster = tokio::task::spawn_blocking(move || vellum_raster::paint(&list, scale, &policy))
            .await
            .map_err(|e| RasterError::Unavailable(format!("capture task failed: {}", e)))??;

        log::debug!(
            "Stage #{} captured at {}x: {}x{} px",
            stage.id(),
            scale,
            raster.width(),
            raster.height()
        );
        Ok(raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{OffscreenStage, StageHost};
    use std::time::Duration;
    use vellum_content::{ContentModel, build};
    use vellum_raster::OriginPolicy;

    fn model() -> ContentModel {
        let mut model = ContentModel::default();
        model.identity.name = "Amara Okafor".to_string();
        model.identity.title = "Staff Engineer".to_string();
        model
    }

    #[tokio::test]
    async fn unsettled_stage_cannot_be_captured() {
        let stage = OffscreenStage::new(StageHost::new(), Duration::from_millis(50));
        let handle = stage.open(build(&model()), 400).unwrap();
        let err = SkiaRasterizer.capture(&handle, 2.0).await.unwrap_err();
        assert_eq!(err, RasterError::NotSettled);
    }

    #[tokio::test]
    async fn raster_width_is_stage_width_times_scale() {
        let stage = OffscreenStage::new(StageHost::new(), Duration::from_millis(200));
        let mut handle = stage.open(build(&model()), 400).unwrap();
        stage.settle(&mut handle).await.unwrap();
        let raster = SkiaRasterizer.capture(&handle, 2.0).await.unwrap();
        assert_eq!(raster.width(), 800);
        let expected = (handle.display_list().unwrap().height * 2.0).ceil() as u32;
        assert_eq!(raster.height(), expected);
    }

    #[tokio::test]
    async fn untrusted_remote_avatar_taints() {
        let mut model = model();
        model.identity.avatar = Some("https://photos.elsewhere.net/me.png".to_string());

        let stage = OffscreenStage::new(StageHost::new(), Duration::from_millis(200))
            .with_origin_policy(OriginPolicy::new(["cdn.example.com"]));
        let mut handle = stage.open(build(&model), 400).unwrap();
        stage.settle(&mut handle).await.unwrap();
        let err = SkiaRasterizer.capture(&handle, 1.0).await.unwrap_err();
        assert!(matches!(err, RasterError::Tainted { src } if src.contains("elsewhere.net")));
    }
}
