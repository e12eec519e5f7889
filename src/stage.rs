//! The off-screen stage.
//!
//! A stage is a fragment attached to a [`StageHost`] at a fixed width. Opening
//! attaches it; [`OffscreenStage::settle`] loads the fragment's fonts and images
//! under a deadline and lays it out; closing detaches it. A [`StageHandle`]
//! detaches exactly once, either through [`StageHandle::close`] or on drop, so
//! no exit path can leave a stage attached.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::task::{Id, JoinSet};
use vellum_content::{FontRequest, LayoutFragment};
use vellum_layout::{DisplayList, FontData, FontLibrary, LayoutEngine, LayoutError, SettledAssets};
use vellum_raster::OriginPolicy;
use vellum_traits::{
    FontError, FontQuery, InMemoryResourceProvider, ResourceError, ResourceProvider,
    SharedResourceData,
};

#[derive(Error, Debug)]
pub enum StageError {
    #[error("Stage width must be positive, got {0}px")]
    InvalidWidth(u32),

    #[error("Stage host already holds stage #{0}")]
    Occupied(u64),

    #[error("Stage layout failed: {0}")]
    Layout(#[from] LayoutError),
}

/// The surface stages attach to. Clones share the same surface.
#[derive(Debug, Clone, Default)]
pub struct StageHost {
    inner: Arc<HostState>,
}

#[derive(Debug, Default)]
struct HostState {
    attached: AtomicUsize,
    opened: AtomicUsize,
    current: AtomicU64,
    next_id: AtomicU64,
}

impl StageHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages currently attached. Zero whenever no export is in flight.
    pub fn attached_count(&self) -> usize {
        self.inner.attached.load(Ordering::SeqCst)
    }

    /// Stages ever opened on this host.
    pub fn opened_count(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    fn attach(&self) -> Result<u64, StageError> {
        if self
            .inner
            .attached
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StageError::Occupied(self.inner.current.load(Ordering::SeqCst)));
        }
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.current.store(id, Ordering::SeqCst);
        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    fn detach(&self, id: u64) {
        self.inner.current.store(0, Ordering::SeqCst);
        self.inner.attached.fetch_sub(1, Ordering::SeqCst);
        log::debug!("Stage #{} detached", id);
    }
}

/// What the settle step managed to load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettleReport {
    pub images_loaded: usize,
    pub fonts_loaded: usize,
    /// Sources that failed to load.
    pub failed: Vec<String>,
    /// Sources still loading when the deadline passed.
    pub timed_out: Vec<String>,
}

impl SettleReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.timed_out.is_empty()
    }
}

/// An attached stage. Detaches on [`close`](Self::close) or drop.
#[derive(Debug)]
pub struct StageHandle {
    id: u64,
    width_px: u32,
    fragment: LayoutFragment,
    origin: OriginPolicy,
    display: Option<DisplayList>,
    host: StageHost,
    attached: bool,
}

impl StageHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width_px(&self) -> u32 {
        self.width_px
    }

    pub fn fragment(&self) -> &LayoutFragment {
        &self.fragment
    }

    /// Which image sources may be captured without tainting the surface.
    pub fn origin_policy(&self) -> &OriginPolicy {
        &self.origin
    }

    /// The laid-out stage, available once settled.
    pub fn display_list(&self) -> Option<&DisplayList> {
        self.display.as_ref()
    }

    pub fn is_settled(&self) -> bool {
        self.display.is_some()
    }

    pub fn close(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if std::mem::take(&mut self.attached) {
            self.host.detach(self.id);
        }
    }
}

impl Drop for StageHandle {
    fn drop(&mut self) {
        self.detach();
    }
}

enum Loaded {
    Image(String, Result<SharedResourceData, ResourceError>),
    Font(FontRequest, Result<FontData, FontError>),
}

/// Opens and settles stages on a host.
#[derive(Clone)]
pub struct OffscreenStage {
    host: StageHost,
    resources: Arc<dyn ResourceProvider>,
    fonts: FontLibrary,
    origin: OriginPolicy,
    settle_timeout: Duration,
}

impl std::fmt::Debug for OffscreenStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OffscreenStage")
            .field("host", &self.host)
            .field("resources", &self.resources.name())
            .field("fonts", &self.fonts)
            .field("settle_timeout", &self.settle_timeout)
            .finish()
    }
}

impl OffscreenStage {
    pub fn new(host: StageHost, settle_timeout: Duration) -> Self {
        Self {
            host,
            resources: Arc::new(InMemoryResourceProvider::new()),
            fonts: FontLibrary::new(),
            origin: OriginPolicy::default(),
            settle_timeout,
        }
    }

    pub fn with_resources(mut self, resources: Arc<dyn ResourceProvider>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_fonts(mut self, fonts: FontLibrary) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_origin_policy(mut self, origin: OriginPolicy) -> Self {
        self.origin = origin;
        self
    }

    pub fn host(&self) -> &StageHost {
        &self.host
    }

    /// Attaches `fragment` to the host at `width_px`.
    pub fn open(&self, fragment: LayoutFragment, width_px: u32) -> Result<StageHandle, StageError> {
        if width_px == 0 {
            return Err(StageError::InvalidWidth(width_px));
        }
        let id = self.host.attach()?;
        log::debug!("Stage #{} attached at {}px", id, width_px);
        Ok(StageHandle {
            id,
            width_px,
            fragment,
            origin: self.origin.clone(),
            display: None,
            host: self.host.clone(),
            attached: true,
        })
    }

    /// Loads every asset the fragment references, then lays the stage out.
    ///
    /// Each font face and image loads on its own blocking task. Whatever has
    /// not finished when `settle_timeout` elapses is abandoned and rendered
    /// absent; failed loads are treated the same way. Only layout errors fail.
    pub async fn settle(&self, handle: &mut StageHandle) -> Result<SettleReport, StageError> {
        let mut tasks = JoinSet::new();
        // Outstanding loads, keyed by task so a panicked load can still be named.
        let mut pending: HashMap<Id, String> = HashMap::new();

        for src in handle.fragment.image_sources() {
            let provider = Arc::clone(&self.resources);
            let label = src.clone();
            let task = tasks.spawn_blocking(move || {
                let result = provider.load(&src);
                Loaded::Image(src, result)
            });
            pending.insert(task.id(), label);
        }
        for request in handle.fragment.font_requests() {
            let fonts = self.fonts.clone();
            let label = font_label(&request);
            let task = tasks.spawn_blocking(move || {
                let query = FontQuery::new(request.family.as_str())
                    .with_weight(request.weight)
                    .with_style(request.style);
                let result = fonts.resolve(&query);
                Loaded::Font(request, result)
            });
            pending.insert(task.id(), label);
        }

        let mut assets = SettledAssets::new();
        let mut report = SettleReport::default();
        let deadline = tokio::time::Instant::now() + self.settle_timeout;

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next_with_id()).await {
                Ok(Some(Ok((id, Loaded::Image(src, result))))) => {
                    pending.remove(&id);
                    match result {
                        Ok(data) => {
                            assets.insert_image(src, data);
                            report.images_loaded += 1;
                        }
                        Err(e) => {
                            log::warn!("Image '{}' failed to load: {}", src, e);
                            report.failed.push(src);
                        }
                    }
                }
                Ok(Some(Ok((id, Loaded::Font(request, result))))) => {
                    let label = font_label(&request);
                    pending.remove(&id);
                    match result {
                        Ok(font) => {
                            assets.insert_font(request, font);
                            report.fonts_loaded += 1;
                        }
                        Err(e) => {
                            log::warn!("Font {} unavailable, using fallback metrics: {}", label, e);
                            report.failed.push(label);
                        }
                    }
                }
                Ok(Some(Err(e))) => {
                    let label = pending
                        .remove(&e.id())
                        .unwrap_or_else(|| format!("task {}", e.id()));
                    log::warn!("Load of '{}' did not complete: {}", label, e);
                    report.failed.push(label);
                }
                Ok(None) => break,
                Err(_) => {
                    tasks.abort_all();
                    let mut late: Vec<String> = pending.drain().map(|(_, label)| label).collect();
                    late.sort();
                    log::warn!(
                        "Settle deadline of {:?} passed with {} asset(s) outstanding: {}",
                        self.settle_timeout,
                        late.len(),
                        late.join(", ")
                    );
                    report.timed_out = late;
                    break;
                }
            }
        }

        let display = LayoutEngine::new(&assets).layout(&handle.fragment, handle.width_px as f32)?;
        log::debug!(
            "Stage #{} settled: {} image(s), {} font(s), laid out {}x{:.0}",
            handle.id,
            report.images_loaded,
            report.fonts_loaded,
            handle.width_px,
            display.height
        );
        handle.display = Some(display);
        Ok(report)
    }
}

fn font_label(request: &FontRequest) -> String {
    format!(
        "{} {}{}",
        request.family,
        request.weight.numeric_value(),
        match request.style {
            vellum_types::FontStyle::Normal => "",
            vellum_types::FontStyle::Italic => " italic",
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use vellum_content::{ContentModel, build};

    fn fragment_with_avatar(src: &str) -> LayoutFragment {
        let mut model = ContentModel::default();
        model.identity.name = "Test Person".to_string();
        model.identity.avatar = Some(src.to_string());
        build(&model)
    }

    #[derive(Debug)]
    struct SlowProvider(Duration);

    impl ResourceProvider for SlowProvider {
        fn load(&self, src: &str) -> Result<SharedResourceData, ResourceError> {
            std::thread::sleep(self.0);
            Err(ResourceError::NotFound(src.to_string()))
        }

        fn exists(&self, _src: &str) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "SlowProvider"
        }
    }

    #[derive(Debug)]
    struct PanickingProvider;

    impl ResourceProvider for PanickingProvider {
        fn load(&self, src: &str) -> Result<SharedResourceData, ResourceError> {
            panic!("decoder crashed on {}", src);
        }

        fn exists(&self, _src: &str) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "PanickingProvider"
        }
    }

    #[test]
    fn handle_detaches_once_on_close() {
        let host = StageHost::new();
        let stage = OffscreenStage::new(host.clone(), Duration::from_millis(10));
        let handle = stage.open(LayoutFragment::default(), 100).unwrap();
        assert_eq!(host.attached_count(), 1);
        handle.close();
        assert_eq!(host.attached_count(), 0);
        assert_eq!(host.opened_count(), 1);
    }

    #[test]
    fn handle_detaches_on_drop() {
        let host = StageHost::new();
        let stage = OffscreenStage::new(host.clone(), Duration::from_millis(10));
        {
            let _handle = stage.open(LayoutFragment::default(), 100).unwrap();
            assert_eq!(host.attached_count(), 1);
        }
        assert_eq!(host.attached_count(), 0);
    }

    #[test]
    fn only_one_stage_at_a_time() {
        let host = StageHost::new();
        let stage = OffscreenStage::new(host.clone(), Duration::from_millis(10));
        let first = stage.open(LayoutFragment::default(), 100).unwrap();
        let err = stage.open(LayoutFragment::default(), 100).unwrap_err();
        assert!(matches!(err, StageError::Occupied(id) if id == first.id()));
        first.close();
        assert!(stage.open(LayoutFragment::default(), 100).is_ok());
    }

    #[test]
    fn zero_width_is_rejected() {
        let host = StageHost::new();
        let stage = OffscreenStage::new(host.clone(), Duration::from_millis(10));
        assert!(matches!(
            stage.open(LayoutFragment::default(), 0),
            Err(StageError::InvalidWidth(0))
        ));
        assert_eq!(host.attached_count(), 0);
    }

    #[tokio::test]
    async fn settle_loads_images_and_lays_out() {
        let provider = InMemoryResourceProvider::new().with("me.png", vec![1, 2, 3]);
        let stage = OffscreenStage::new(StageHost::new(), Duration::from_secs(2))
            .with_resources(Arc::new(provider));
        let mut handle = stage.open(fragment_with_avatar("me.png"), 794).unwrap();
        assert!(!handle.is_settled());

        let report = stage.settle(&mut handle).await.unwrap();
        assert_eq!(report.images_loaded, 1);
        assert!(report.timed_out.is_empty());
        let list = handle.display_list().unwrap();
        assert_eq!(list.width, 794.0);
        assert!(list.height > 0.0);
        assert_eq!(list.image_sources().collect::<Vec<_>>(), vec!["me.png"]);
    }

    #[tokio::test]
    async fn missing_assets_degrade_instead_of_failing() {
        let stage = OffscreenStage::new(StageHost::new(), Duration::from_secs(2));
        let mut handle = stage.open(fragment_with_avatar("missing.png"), 794).unwrap();
        let report = stage.settle(&mut handle).await.unwrap();
        assert!(report.failed.contains(&"missing.png".to_string()));
        assert!(!report.is_complete());
        assert!(handle.is_settled());
    }

    #[tokio::test]
    async fn crashed_load_is_reported_as_failed() {
        let stage = OffscreenStage::new(StageHost::new(), Duration::from_secs(2))
            .with_resources(Arc::new(PanickingProvider));
        let mut handle = stage.open(fragment_with_avatar("crash.png"), 794).unwrap();
        let report = stage.settle(&mut handle).await.unwrap();
        assert!(report.failed.contains(&"crash.png".to_string()));
        assert!(report.timed_out.is_empty());
        assert_eq!(report.images_loaded, 0);
        assert!(handle.is_settled());
    }

    #[tokio::test]
    async fn slow_assets_are_abandoned_at_the_deadline() {
        let stage = OffscreenStage::new(StageHost::new(), Duration::from_millis(150))
            .with_resources(Arc::new(SlowProvider(Duration::from_millis(800))));
        let mut handle = stage.open(fragment_with_avatar("slow.png"), 794).unwrap();
        let report = stage.settle(&mut handle).await.unwrap();
        assert_eq!(report.timed_out, vec!["slow.png".to_string()]);
        assert!(handle.is_settled());
    }
}
