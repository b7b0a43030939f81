/// The autoescape setting resolved for a template at compile time.
///
/// Priority order when resolving (highest first): explicit constructor
/// argument, `{% autoescape %}` directive, Loader default, engine default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Autoescape {
    /// Apply the named function (looked up in the evaluation environment)
    /// to every non-raw expression's stringified result.
    Named(String),
    /// No escaping is applied.
    Disabled,
}

impl Autoescape {
    pub fn engine_default() -> Self {
        Autoescape::Named("xhtml_escape".to_string())
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Autoescape::Named(n) => Some(n.as_str()),
            Autoescape::Disabled => None,
        }
    }
}
