pub mod autoescape;
pub mod location;
pub mod whitespace;

pub use autoescape::Autoescape;
pub use location::SourceLocation;
pub use whitespace::WhitespaceMode;
