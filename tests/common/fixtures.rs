use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::sync::Notify;
use vellum::{
    ContentModel, Notice, Notifier, Raster, RasterError, Rasterizer, StageHandle, StageHost,
};
use vellum_types::Color;

/// A profile with 3 experience entries and 2 education entries.
pub fn sample_model() -> ContentModel {
    let value = json!({
        "identity": {
            "name": "Amara Okafor",
            "title": "Staff Platform Engineer",
            "summary": "Builds reliable infrastructure for teams that ship every day.",
            "email": "amara@example.com",
            "phone": "+44 20 7946 0000",
            "location": "London, UK"
        },
        "experience": [
            {
                "company": "Northwind",
                "position": "Staff Engineer",
                "startDate": "2021-03",
                "highlights": ["Led the storage migration", "Cut p99 latency by 40%"]
            },
            {
                "company": "Contoso",
                "position": "Senior Engineer",
                "startDate": "2017-06",
                "endDate": "2021-02",
                "description": "Owned the build and release pipeline."
            },
            {
                "company": "Fabrikam",
                "position": "Software Engineer",
                "startDate": "2014-09",
                "endDate": "2017-05",
                "highlights": ["Shipped the first mobile client"]
            }
        ],
        "education": [
            {
                "institution": "University of Lagos",
                "degree": "BSc",
                "field": "Computer Science",
                "endDate": "2014",
                "honors": "First Class"
            },
            {
                "institution": "Open University",
                "degree": "MSc",
                "field": "Distributed Systems",
                "endDate": "2019"
            }
        ],
        "skills": [
            { "name": "Languages", "skills": ["Rust", "Go", "TypeScript"] }
        ]
    });
    ContentModel::from_json(&value.to_string()).expect("sample model is valid")
}

/// Captures a flat raster of a fixed size, ignoring the stage content.
#[derive(Debug)]
pub struct FixedRasterizer {
    pub width: u32,
    pub height: u32,
    pub calls: AtomicUsize,
}

impl FixedRasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Rasterizer for FixedRasterizer {
    async fn capture(&self, stage: &StageHandle, scale: f32) -> Result<Raster, RasterError> {
        if !stage.is_settled() {
            return Err(RasterError::NotSettled);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Raster::filled(self.width, self.height, scale, Color::gray(230))
    }
}

/// Always fails, as a capture surface that cannot be created would.
#[derive(Debug, Default)]
pub struct FailingRasterizer;

impl Rasterizer for FailingRasterizer {
    async fn capture(&self, _stage: &StageHandle, _scale: f32) -> Result<Raster, RasterError> {
        Err(RasterError::Unavailable("injected capture fault".to_string()))
    }
}

/// Blocks inside `capture` until released.
#[derive(Debug, Clone, Default)]
pub struct GatedRasterizer {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

impl Rasterizer for GatedRasterizer {
    async fn capture(&self, _stage: &StageHandle, scale: f32) -> Result<Raster, RasterError> {
        self.entered.notify_one();
        self.release.notified().await;
        Raster::filled(40, 100, scale, Color::WHITE)
    }
}

/// Records notices together with the number of attached stages at the time.
#[derive(Debug)]
pub struct RecordingNotifier {
    host: StageHost,
    seen: Mutex<Vec<(Notice, usize)>>,
}

impl RecordingNotifier {
    pub fn new(host: StageHost) -> Self {
        Self {
            host,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<(Notice, usize)> {
        self.seen.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        let attached = self.host.attached_count();
        if let Ok(mut seen) = self.seen.lock() {
            seen.push((notice, attached));
        }
    }
}

/// A small opaque PNG.
pub fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("png encodes");
    out.into_inner()
}
