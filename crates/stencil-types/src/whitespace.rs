/// Controls how runs of whitespace in literal template text are collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhitespaceMode {
    /// Leave whitespace untouched.
    #[default]
    All,
    /// Collapse horizontal whitespace runs to a single space and newline
    /// runs (with surrounding horizontal whitespace) to a single newline.
    Single,
    /// Collapse every whitespace run, including newlines, to a single space.
    Oneline,
}

impl WhitespaceMode {
    /// Parses the argument of a `{% whitespace %}` directive or a Loader default.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "all" => Some(WhitespaceMode::All),
            "single" => Some(WhitespaceMode::Single),
            "oneline" => Some(WhitespaceMode::Oneline),
            _ => None,
        }
    }

    /// Default mode for a template identified by `name`, matching the
    /// historical convention that `.html`/`.js` templates default to
    /// `single` while everything else defaults to `all`.
    pub fn default_for_name(name: &str) -> Self {
        if name.ends_with(".html") || name.ends_with(".js") {
            WhitespaceMode::Single
        } else {
            WhitespaceMode::All
        }
    }

    /// Maps the deprecated `compress_whitespace: bool` constructor knob.
    pub fn from_compress_flag(compress: bool) -> Self {
        if compress {
            WhitespaceMode::Single
        } else {
            WhitespaceMode::All
        }
    }

    /// Applies this mode to a chunk of literal text, honoring the `<pre>` guard.
    pub fn filter(self, text: &str) -> String {
        if text.contains("<pre>") {
            return text.to_string();
        }
        match self {
            WhitespaceMode::All => text.to_string(),
            WhitespaceMode::Single => filter_single(text),
            WhitespaceMode::Oneline => filter_oneline(text),
        }
    }
}

fn filter_single(text: &str) -> String {
    // Collapse horizontal whitespace runs first, then fold any run that
    // contains a newline (plus its surrounding horizontal whitespace) down
    // to a single newline.
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' || c == '\t' || c == '\n' || c == '\r' {
            let mut saw_newline = c == '\n' || c == '\r';
            while let Some(&next) = chars.peek() {
                if next == ' ' || next == '\t' || next == '\n' || next == '\r' {
                    saw_newline |= next == '\n' || next == '\r';
                    chars.next();
                } else {
                    break;
                }
            }
            out.push(if saw_newline { '\n' } else { ' ' });
        } else {
            out.push(c);
        }
    }
    out
}

fn filter_oneline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_collapses_horizontal_runs() {
        assert_eq!(WhitespaceMode::Single.filter("a   b"), "a b");
    }

    #[test]
    fn single_collapses_newline_runs() {
        assert_eq!(WhitespaceMode::Single.filter("a  \n  b"), "a\nb");
    }

    #[test]
    fn oneline_collapses_everything() {
        assert_eq!(WhitespaceMode::Oneline.filter("a  \n  b"), "a b");
    }

    #[test]
    fn pre_guard_is_untouched() {
        let text = "<pre>a   b\n c</pre>";
        assert_eq!(WhitespaceMode::Oneline.filter(text), text);
    }

    #[test]
    fn default_for_name_uses_extension() {
        assert_eq!(WhitespaceMode::default_for_name("page.html"), WhitespaceMode::Single);
        assert_eq!(WhitespaceMode::default_for_name("widget.js"), WhitespaceMode::Single);
        assert_eq!(WhitespaceMode::default_for_name("report.txt"), WhitespaceMode::All);
    }
}
