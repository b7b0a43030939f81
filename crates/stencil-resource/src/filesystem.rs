//! Filesystem-based resource provider.
//!
//! # Security
//!
//! The provider validates that all resolved paths remain within the base
//! path to prevent directory traversal attacks (e.g. `../../../etc/passwd`).

use crate::{ResourceError, ResourceProvider, SharedResourceData};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loads resources from the local filesystem, confined to a base directory.
#[derive(Debug)]
pub struct FilesystemResourceProvider {
    base_path: PathBuf,
    canonical_base: Option<PathBuf>,
}

impl FilesystemResourceProvider {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        let base = base_path.as_ref().to_path_buf();
        let canonical = base.canonicalize().ok();
        Self { base_path: base, canonical_base: canonical }
    }

    pub fn base(&self) -> &Path {
        &self.base_path
    }

    /// Returns `None` if `path` would escape the base directory.
    fn resolve_path_safe(&self, path: &str) -> Option<PathBuf> {
        if Path::new(path).is_absolute() {
            return None;
        }

        let full_path = self.base_path.join(path);

        if let Ok(canonical) = full_path.canonicalize() {
            if let Some(ref base) = self.canonical_base {
                return if canonical.starts_with(base) { Some(canonical) } else { None };
            }
        }

        for component in Path::new(path).components() {
            if let std::path::Component::ParentDir = component {
                return None;
            }
        }

        Some(full_path)
    }
}

impl ResourceProvider for FilesystemResourceProvider {
    fn load(&self, path: &str) -> Result<SharedResourceData, ResourceError> {
        let full_path = self
            .resolve_path_safe(path)
            .ok_or_else(|| ResourceError::NotFound(format!("{path} (path traversal blocked)")))?;

        std::fs::read(&full_path).map(Arc::new).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ResourceError::NotFound(path.to_string())
            } else {
                ResourceError::LoadFailed { path: path.to_string(), message: e.to_string() }
            }
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve_path_safe(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn base_path(&self) -> Option<&str> {
        self.base_path.to_str()
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
    fn loads_existing_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("test.txt"), b"Hello, World!").unwrap();
        let provider = FilesystemResourceProvider::new(dir.path());
        assert_eq!(&*provider.load("test.txt").unwrap(), b"Hello, World!");
    }

    #[test]
    fn reports_not_found() {
        let dir = tempdir().unwrap();
        let provider = FilesystemResourceProvider::new(dir.path());
        assert!(matches!(provider.load("nonexistent.txt"), Err(ResourceError::NotFound(_))));
    }

    #[test]
    fn blocks_path_traversal() {
        let dir = tempdir().unwrap();
        let provider = FilesystemResourceProvider::new(dir.path());
        assert!(provider.load("../../../etc/passwd").is_err());
        assert!(!provider.exists("../../../etc/passwd"));
    }

    #[test]
    fn blocks_absolute_paths() {
        let dir = tempdir().unwrap();
        let provider = FilesystemResourceProvider::new(dir.path());
        assert!(provider.load("/etc/passwd").is_err());
    }

    #[test]
    fn allows_nested_paths() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        fs::write(dir.path().join("subdir/nested.txt"), b"nested").unwrap();
        let provider = FilesystemResourceProvider::new(dir.path());
        assert!(provider.exists("subdir/nested.txt"));
        assert_eq!(&*provider.load("subdir/nested.txt").unwrap(), b"nested");
    }
}
