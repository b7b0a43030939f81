//! Resolves an `extends`/`include` name relative to the template that
//! referenced it, the way a relative filesystem include would be resolved
//! relative to its including file's directory.

/// Joins `name` against the directory of `parent`, if `parent` is given and
/// `name` looks relative (contains no leading `/`). Always normalizes `.`
/// and `..` components so templates can't escape the loader's root purely
/// through `include` path text (the underlying `ResourceProvider` enforces
/// the hard boundary; this just keeps the logical name canonical for
/// caching purposes).
pub fn resolve_name(name: &str, parent: Option<&str>) -> String {
    if name.starts_with('/') {
        return normalize(name.trim_start_matches('/'));
    }
    let joined = match parent.and_then(|p| p.rsplit_once('/')) {
        Some((dir, _)) => format!("{dir}/{name}"),
        _ => name.to_string(),
    };
    normalize(&joined)
}

fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_to_parent_directory() {
        assert_eq!(resolve_name("footer.html", Some("views/page.html")), "views/footer.html");
    }

    #[test]
    fn no_parent_resolves_as_is() {
        assert_eq!(resolve_name("index.html", None), "index.html");
    }

    #[test]
    fn normalizes_parent_directory_references() {
        assert_eq!(resolve_name("../shared/footer.html", Some("views/pages/page.html")), "views/shared/footer.html");
    }

    #[test]
    fn leading_slash_is_root_relative() {
        assert_eq!(resolve_name("/shared/footer.html", Some("views/page.html")), "shared/footer.html");
    }
}
