//! Asset providers for the vellum export stage.
//!
//! - [`FilesystemResourceProvider`]: loads assets from a local directory, including
//!   a mirror layout for remote `http(s)` image URLs.
//!
//! The in-memory provider lives in `vellum-traits` and is re-exported here.

mod filesystem;

pub use filesystem::FilesystemResourceProvider;

pub use vellum_traits::InMemoryResourceProvider;
