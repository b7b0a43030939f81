//! Caches compiled templates by logical name and resolves `extends`/`include`
//! references against a [`stencil_resource::ResourceProvider`].
//!
//! This is the `Loader` of the system overview: the only component that owns
//! shared, mutable state (the compiled-template cache), guarded so that
//! compiling one template can safely trigger nested compilation of the
//! templates it `extends`/`include`s.

pub mod error;
pub mod loader;
pub mod path;

pub use error::LoaderError;
pub use loader::Loader;
