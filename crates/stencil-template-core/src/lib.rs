//! Parses, resolves, and renders a single template's text, independent of
//! how that text and its ancestors/includes were located on disk — that is
//! the concern of a `Loader` built on top of the `TemplateSource` trait here.

pub mod ast;
pub mod error;
pub mod instr;
pub mod lower;
pub mod parser;
pub mod reader;
pub mod render;
pub mod template;

pub use error::{CompileError, ParseError, RenderError, TemplateCoreError};
pub use instr::{Instr, Stmt};
pub use parser::Parser;
pub use template::{CompileOptions, NamedBlockMap, Template, TemplateSource};
