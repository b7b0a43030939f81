use std::fmt;

/// A position within a named template's source, used for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    pub template: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(template: impl Into<String>, line: u32) -> Self {
        Self { template: template.into(), line }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.template, self.line)
    }
}
