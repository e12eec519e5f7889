//! Handing the finished document to the user.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

const FILENAME_SUFFIX: &str = "_Resume.pdf";

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Delivery rejected '{filename}': {message}")]
    Rejected { filename: String, message: String },
}

/// The "save as" step. Receives the serialized document and its filename.
pub trait Delivery: Send + Sync {
    fn deliver(&self, bytes: Vec<u8>, filename: &str) -> Result<(), DeliveryError>;
}

/// `<name with whitespace runs replaced by underscores>_Resume.pdf`.
///
/// Path separators and other characters no filesystem accepts in a file name
/// also become underscores.
pub fn document_filename(person_name: &str) -> String {
    let stem = person_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .replace(is_reserved, "_");
    if stem.is_empty() {
        "Resume.pdf".to_string()
    } else {
        format!("{}{}", stem, FILENAME_SUFFIX)
    }
}

fn is_reserved(c: char) -> bool {
    matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|') || c.is_control()
}

/// Writes each document into a directory, creating it on first use.
#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    dir: PathBuf,
}

impl DirectoryDelivery {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }
}

impl Delivery for DirectoryDelivery {
    fn deliver(&self, bytes: Vec<u8>, filename: &str) -> Result<(), DeliveryError> {
        let name = Path::new(filename);
        if name.file_name() != Some(name.as_os_str()) {
            return Err(DeliveryError::Rejected {
                filename: filename.to_string(),
                message: "filename must not contain a path".to_string(),
            });
        }

        let path = self.path_for(filename);
        let io_err = |source| DeliveryError::Io {
            path: path.display().to_string(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        std::fs::write(&path, &bytes).map_err(io_err)?;
        log::info!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Keeps delivered documents in memory.
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    files: Mutex<Vec<DeliveredFile>>,
}

impl MemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> Vec<DeliveredFile> {
        self.files.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.files.lock().map(|f| f.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<DeliveredFile> {
        self.files.lock().ok().and_then(|f| f.last().cloned())
    }
}

impl Delivery for MemoryDelivery {
    fn deliver(&self, bytes: Vec<u8>, filename: &str) -> Result<(), DeliveryError> {
        let mut files = self.files.lock().map_err(|_| DeliveryError::Rejected {
            filename: filename.to_string(),
            message: "delivery store lock poisoned".to_string(),
        })?;
        files.push(DeliveredFile {
            filename: filename.to_string(),
            bytes,
        });
        Ok(())
    }
}
