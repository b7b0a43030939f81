use stencil_resource::ResourceError;
use stencil_template_core::TemplateCoreError;
use thiserror::Error;

/// Failures raised while locating, reading, or compiling a named template.
#[derive(Error, Debug, Clone)]
pub enum LoaderError {
    #[error("template not found: {0}")]
    NotFound(String),

    #[error("failed to read template {name}: {source}")]
    Resource { name: String, source: ResourceError },

    #[error("template source is not valid UTF-8: {0}")]
    InvalidUtf8(String),

    #[error("circular template reference detected: {0}")]
    CircularReference(String),

    #[error(transparent)]
    Compile(#[from] TemplateCoreError),
}
