use thiserror::Error;

/// A syntax error in the embedded expression sublanguage. Surfaces to callers
/// as part of a `CompileError` once a template containing the offending
/// expression is constructed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ExprParseError {
    pub message: String,
}

impl ExprParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// A failure while evaluating a parsed expression against an `Environment`.
#[derive(Error, Debug, Clone)]
pub enum EvalError {
    #[error("unknown identifier: {0}")]
    UnknownIdentifier(String),

    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("value is not callable: {0}")]
    NotCallable(String),

    #[error("type error: {0}")]
    TypeError(String),

    #[error("index error: {0}")]
    IndexError(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("reserved identifier used as a binding: {0}")]
    ReservedIdentifier(String),
}
