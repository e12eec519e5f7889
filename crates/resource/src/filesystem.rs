//! Filesystem-based asset provider.
//!
//! Relative sources resolve against the base directory. Remote sources
//! (`https://host/path/img.png`) resolve to a mirrored copy at
//! `<base>/host/path/img.png`, which is how pre-fetched portfolio assets are
//! laid out on disk. Resolved paths never escape the base directory.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use vellum_traits::{ResourceError, ResourceProvider, SharedResourceData};

#[derive(Debug)]
pub struct FilesystemResourceProvider {
    base_path: PathBuf,
    canonical_base: Option<PathBuf>,
}

impl FilesystemResourceProvider {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        let base = base_path.as_ref().to_path_buf();
        let canonical = base.canonicalize().ok();
        Self {
            base_path: base,
            canonical_base: canonical,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base_path
    }

    /// Maps an asset `src` to a path relative to the base directory.
    fn relative_path_for(src: &str) -> Option<PathBuf> {
        let src = src.trim();
        let rel = if let Some(rest) = src
            .strip_prefix("https://")
            .or_else(|| src.strip_prefix("http://"))
        {
            let rest = rest.split(['?', '#']).next().unwrap_or(rest);
            PathBuf::from(rest)
        } else if let Some(rest) = src.strip_prefix("file://") {
            PathBuf::from(rest.trim_start_matches('/'))
        } else {
            let path = Path::new(src);
            if path.is_absolute() {
                return None;
            }
            path.to_path_buf()
        };

        if rel.as_os_str().is_empty()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)))
        {
            return None;
        }
        Some(rel)
    }

    fn resolve_path_safe(&self, src: &str) -> Option<PathBuf> {
        let full_path = self.base_path.join(Self::relative_path_for(src)?);

        if let Ok(canonical) = full_path.canonicalize()
            && let Some(ref base) = self.canonical_base
        {
            // Symlinks may still point outside the base directory.
            return canonical.starts_with(base).then_some(canonical);
        }
        Some(full_path)
    }
}

impl ResourceProvider for FilesystemResourceProvider {
    fn load(&self, src: &str) -> Result<SharedResourceData, ResourceError> {
        let full_path = self.resolve_path_safe(src).ok_or_else(|| {
            log::warn!("Rejected asset path outside base directory: {}", src);
            ResourceError::NotFound(format!("{} (outside asset directory)", src))
        })?;

        std::fs::read(&full_path).map(Arc::new).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound(src.to_string())
            } else {
                ResourceError::LoadFailed {
                    src: src.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }

    fn exists(&self, src: &str) -> bool {
        self.resolve_path_safe(src)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    fn name(&self) -> &'static str {
        "FilesystemResourceProvider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_relative_asset() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("avatar.png"), b"png").unwrap();

        let provider = FilesystemResourceProvider::new(dir.path());
        assert_eq!(&*provider.load("avatar.png").unwrap(), b"png");
    }

    #[test]
    fn remote_url_resolves_to_mirror() {
        let dir = tempdir().unwrap();
        let mirror = dir.path().join("cdn.example.com").join("img");
        fs::create_dir_all(&mirror).unwrap();
        fs::write(mirror.join("me.jpg"), b"jpg").unwrap();

        let provider = FilesystemResourceProvider::new(dir.path());
        let data = provider
            .load("https://cdn.example.com/img/me.jpg?size=large")
            .unwrap();
        assert_eq!(&*data, b"jpg");
        assert!(provider.exists("http://cdn.example.com/img/me.jpg"));
    }

    #[test]
    fn missing_asset_is_not_found() {
        let dir = tempdir().unwrap();
        let provider = FilesystemResourceProvider::new(dir.path());
        assert!(matches!(
            provider.load("nope.png"),
            Err(ResourceError::NotFound(_))
        ));
    }

    #[test]
    fn blocks_traversal_and_absolute_paths() {
        let dir = tempdir().unwrap();
        let provider = FilesystemResourceProvider::new(dir.path());

        assert!(provider.load("../../../etc/passwd").is_err());
        assert!(provider.load("/etc/passwd").is_err());
        assert!(!provider.exists("https://evil.example/../../secret"));
        assert!(!provider.exists("file:///../etc/passwd"));
        assert!(!provider.exists(""));
    }
}
