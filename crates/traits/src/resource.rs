//! ResourceProvider trait for loading assets referenced by a layout fragment.
//!
//! The export stage never touches the network or the filesystem directly: every
//! image `src` found in a fragment is resolved through a provider. This keeps the
//! settle step testable and lets embedders decide where bytes come from.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ResourceError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Failed to load resource '{src}': {message}")]
    LoadFailed { src: String, message: String },

    #[error("Invalid resource format: {0}")]
    InvalidFormat(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for ResourceError {
    fn from(err: std::io::Error) -> Self {
        ResourceError::Io(err.to_string())
    }
}

/// Reference-counted asset bytes.
pub type SharedResourceData = Arc<Vec<u8>>;

/// Loads asset bytes by the `src` string used in the fragment.
///
/// Implementations must be cheap to share across the blocking tasks the stage
/// spawns while settling, hence `Send + Sync`.
pub trait ResourceProvider: Send + Sync + Debug {
    fn load(&self, src: &str) -> Result<SharedResourceData, ResourceError>;

    fn exists(&self, src: &str) -> bool;

    /// Human-readable provider name, used in log lines.
    fn name(&self) -> &'static str;
}

/// Asset store backed by a map. Works everywhere, including tests.
#[derive(Debug, Default)]
pub struct InMemoryResourceProvider {
    entries: RwLock<HashMap<String, SharedResourceData>>,
}

impl InMemoryResourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `data` under `src`, replacing any previous entry.
    pub fn insert(&self, src: impl Into<String>, data: Vec<u8>) -> Result<(), ResourceError> {
        let src = src.into();
        let mut entries = self.entries.write().map_err(|_| ResourceError::LoadFailed {
            src: src.clone(),
            message: "resource store lock poisoned".to_string(),
        })?;
        entries.insert(src, Arc::new(data));
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert) for fixtures.
    pub fn with(self, src: impl Into<String>, data: Vec<u8>) -> Self {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(src.into(), Arc::new(data));
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResourceProvider for InMemoryResourceProvider {
    fn load(&self, src: &str) -> Result<SharedResourceData, ResourceError> {
        let entries = self.entries.read().map_err(|_| ResourceError::LoadFailed {
            src: src.to_string(),
            message: "resource store lock poisoned".to_string(),
        })?;
        entries
            .get(src)
            .cloned()
            .ok_or_else(|| ResourceError::NotFound(src.to_string()))
    }

    fn exists(&self, src: &str) -> bool {
        self.entries
            .read()
            .map(|e| e.contains_key(src))
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "InMemoryResourceProvider"
    }
}
