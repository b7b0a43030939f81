//! Byte-level resource providers. A `ResourceProvider` knows how to load a
//! named resource's raw bytes; it does not know anything about template
//! syntax, caching, or inheritance — that is `stencil-loader`'s job.

mod filesystem;
mod memory;

pub use filesystem::FilesystemResourceProvider;
pub use memory::InMemoryResourceProvider;

use std::sync::Arc;
use thiserror::Error;

pub type SharedResourceData = Arc<Vec<u8>>;

#[derive(Error, Debug, Clone)]
pub enum ResourceError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("failed to load resource {path}: {message}")]
    LoadFailed { path: String, message: String },
}

/// An abstract byte-level source for named resources.
pub trait ResourceProvider: Send + Sync {
    /// Loads the raw bytes of `path`.
    fn load(&self, path: &str) -> Result<SharedResourceData, ResourceError>;

    /// Reports whether `path` exists without loading its contents.
    fn exists(&self, path: &str) -> bool;

    /// The base path resources are resolved relative to, if any.
    fn base_path(&self) -> Option<&str>;

    /// A short provider name, used in diagnostics.
    fn name(&self) -> &'static str;
}
