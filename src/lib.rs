// --- Module Structure ---
// `engine`:   The main public API: loads and renders templates by name.
// `escape`:   Concrete escape/utility functions installed in every environment.
// `datetime`: The `chrono`-backed `datetime` handle installed in every environment.
//
// The actual lexer/parser/IR/evaluator pipeline lives in the `stencil-*`
// library crates this package depends on and re-exports from; this crate's
// own code is the glue that turns them into a single engine a caller
// constructs once and renders many templates through.

mod datetime;
mod engine;
mod escape;

// --- Public API ---
// By exposing only these top-level items, we provide a clean and focused
// public interface for users of the library.

pub use crate::engine::{Engine, EngineError};

pub use stencil_expr::{EvalError, Value};
pub use stencil_loader::LoaderError;
pub use stencil_resource::{FilesystemResourceProvider, InMemoryResourceProvider, ResourceProvider};
pub use stencil_template_core::{CompileOptions, RenderError, TemplateCoreError};
pub use stencil_types::{Autoescape, WhitespaceMode};
