//! Concrete default implementations of the escape/utility namespace every
//! template's evaluation environment is seeded with (`escape`,
//! `xhtml_escape`, `url_escape`, `json_encode`, `squeeze`, `linkify`).

use once_cell::sync::Lazy;
use regex::Regex;

/// Escapes `&`, `<`, `>`, `"`, `'` for safe embedding in HTML/XML text.
pub fn xhtml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Percent-encodes `s` for use as a URL query component, leaving only the
/// characters RFC 3986 marks unreserved untouched.
pub fn url_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(*byte as char);
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

/// Encodes a value as JSON text, delegating to `serde_json`.
pub fn json_encode(v: &serde_json::Value) -> String {
    serde_json::to_string(v).unwrap_or_else(|_| "null".to_string())
}

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is a valid regex"));

/// Collapses every run of whitespace (including newlines) to a single space
/// and strips leading/trailing whitespace. Unlike the `oneline` whitespace
/// mode used for template text chunks, this has no `<pre>` guard — it's a
/// general-purpose string utility, not a template-rendering pass.
pub fn squeeze(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

static URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(https?://[^\s<>"']+)"#).expect("linkify pattern is a valid regex")
});

/// Wraps bare `http(s)://` URLs in `<a href="...">` tags. Conservative: it
/// only recognizes whitespace- and quote-delimited runs, and does not strip
/// trailing punctuation the way a full linkifier would.
pub fn linkify(s: &str) -> String {
    URL_PATTERN
        .replace_all(s, |caps: &regex::Captures| {
            let url = &caps[1];
            format!("<a href=\"{}\">{}</a>", xhtml_escape(url), xhtml_escape(url))
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xhtml_escape_covers_the_five_characters() {
        assert_eq!(xhtml_escape(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    }

    #[test]
    fn url_escape_percent_encodes_reserved_characters() {
        assert_eq!(url_escape("a b/c"), "a%20b%2Fc");
    }

    #[test]
    fn json_encode_matches_serde_json() {
        assert_eq!(json_encode(&serde_json::json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn squeeze_collapses_all_whitespace() {
        assert_eq!(squeeze("a  \n  b"), "a b");
    }

    #[test]
    fn squeeze_strips_leading_and_trailing_whitespace() {
        assert_eq!(squeeze("  a b  "), "a b");
    }

    #[test]
    fn squeeze_collapses_whitespace_even_inside_pre() {
        assert_eq!(squeeze("<pre>a  \n  b</pre>"), "<pre>a b</pre>");
    }

    #[test]
    fn linkify_wraps_bare_urls() {
        assert_eq!(
            linkify("see https://example.com/x for more"),
            r#"see <a href="https://example.com/x">https://example.com/x</a> for more"#
        );
    }
}
