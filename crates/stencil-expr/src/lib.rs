//! The embedded expression sublanguage evaluated by `{{ }}`, `set`, `if`,
//! `for`, `while`, and `apply` directives.
//!
//! A Rust binary cannot splice a template expression into host source and
//! `exec()` it the way the engine this crate's sibling `stencil-template-core`
//! is modeled on does. Instead, expressions are parsed into a small typed
//! AST here and evaluated directly against a scoped [`Environment`].

pub mod ast;
pub mod environment;
pub mod error;
pub mod eval;
pub mod functions;
pub mod parser;
pub mod value;

pub use ast::{BinaryOp, Expr, ForTarget, Literal, UnaryOp};
pub use environment::Environment;
pub use error::{EvalError, ExprParseError};
pub use eval::evaluate;
pub use value::{NativeFn, Value};

/// Builds a fresh `Environment` with the sublanguage's builtins installed.
pub fn base_environment() -> Environment {
    let mut env = Environment::new();
    functions::install_builtins(&mut env);
    env
}
