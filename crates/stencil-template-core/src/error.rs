use stencil_expr::EvalError;
use stencil_types::SourceLocation;
use thiserror::Error;

/// A structural or syntactic violation in template text. Fatal for the
/// template being parsed; carries the filename and the 1-based line at
/// which the violation was detected.
#[derive(Error, Debug, Clone)]
#[error("{}: {message}", location)]
pub struct ParseError {
    pub location: SourceLocation,
    pub message: String,
}

impl ParseError {
    pub fn new(template: impl Into<String>, line: u32, message: impl Into<String>) -> Self {
        Self { location: SourceLocation::new(template, line), message: message.into() }
    }
}

/// A syntax error in an embedded expression/statement, discovered while
/// constructing a `Template`. Carries a pretty-printed dump of the IR
/// produced so far, logged at `error` level before being returned.
#[derive(Error, Debug, Clone)]
#[error("{}: {message}", location)]
pub struct CompileError {
    pub location: SourceLocation,
    pub message: String,
    pub ir_dump: String,
}

impl CompileError {
    pub fn new(
        template: impl Into<String>,
        line: u32,
        message: impl Into<String>,
        ir_dump: impl Into<String>,
    ) -> Self {
        Self {
            location: SourceLocation::new(template, line),
            message: message.into(),
            ir_dump: ir_dump.into(),
        }
    }
}

/// A failure raised while evaluating the compiled IR against a render-time
/// `Environment`.
#[derive(Error, Debug, Clone)]
pub enum RenderError {
    #[error("{location}: {source}")]
    Eval { location: SourceLocation, source: EvalError },

    #[error("caller-supplied argument uses the reserved '_tt_' prefix: {0}")]
    ReservedArgument(String),

    #[error("{location}: {{% module %}} used without a host-supplied _tt_modules namespace")]
    MissingModules { location: SourceLocation },
}

/// The error taxonomy of the template-core pipeline. A `TemplateSource`
/// implementation (provided by a Loader) reports its own failures through
/// the `Source` variant rather than this crate depending on loader types.
#[derive(Error, Debug, Clone)]
pub enum TemplateCoreError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("{0}")]
    Source(String),
}
