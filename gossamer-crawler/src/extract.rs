//! Pattern-based link candidate extraction.
//!
//! Deliberately not an HTML parser: page markup, scripts and structured
//! bodies are all scanned with the same three patterns, so API routes
//! mentioned in JavaScript or JSON surface alongside anchor tags.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Absolute URLs with a plausible registered host.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[a-zA-Z0-9\-\.]+\.[a-zA-Z]{2,}(?:/[^"'\s<>`]*)?"#)
        .expect("hardcoded regex pattern is valid")
});

/// Quoted absolute or relative path strings, e.g. `"/api/v1/items"`.
static PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"["'](\.?\.?/[^"'\s<>`]+)["']"#).expect("hardcoded regex pattern is valid")
});

/// `href`/`src` attribute values, quoted either way.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:href|src)=["']([^"']+)["']"#).expect("hardcoded regex pattern is valid")
});

/// Scan raw content for candidate references, deduplicated across all
/// three patterns in first-seen order. Candidates containing whitespace or
/// of length <= 1 are discarded.
pub fn extract_candidates(content: &str) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut found: Vec<String> = Vec::new();
    let mut add = |candidate: &str| {
        if candidate.len() > 1
            && !candidate.chars().any(char::is_whitespace)
            && seen.insert(candidate.to_string())
        {
            found.push(candidate.to_string());
        }
    };

    for m in URL_RE.find_iter(content) {
        add(m.as_str());
    }
    for caps in PATH_RE.captures_iter(content) {
        add(&caps[1]);
    }
    for caps in ATTR_RE.captures_iter(content) {
        add(&caps[1]);
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_absolute_urls_in_plain_text() {
        let found = extract_candidates("see https://example.com/docs for details");
        assert_eq!(found, vec!["https://example.com/docs"]);
    }

    #[test]
    fn finds_quoted_paths() {
        let found = extract_candidates(r#"fetch("/api/v1/items").then(render)"#);
        assert_eq!(found, vec!["/api/v1/items"]);
    }

    #[test]
    fn finds_href_and_src_attributes() {
        let found =
            extract_candidates(r#"<a href="about.html">x</a><script src='app.js'></script>"#);
        assert_eq!(found, vec!["about.html", "app.js"]);
    }

    #[test]
    fn deduplicates_across_patterns() {
        // The attribute value is also matched by the URL pattern; it must
        // appear once.
        let found = extract_candidates(r#"<a href="https://example.com/a">link</a>"#);
        assert_eq!(found, vec!["https://example.com/a"]);
    }

    #[test]
    fn discards_whitespace_and_short_candidates() {
        let found = extract_candidates(r#"<a href="/a b"></a><a href="/"></a>"#);
        assert!(found.is_empty());
    }

    #[test]
    fn mixed_body_yields_all_reference_kinds() {
        let body = concat!(
            r#"<a href="/about">About</a>"#,
            r#"<script src="https://cdn.external.test/a.js"></script>"#,
            r#"var api = "/api/v1/items";"#,
        );
        let found = extract_candidates(body);
        assert_eq!(found.len(), 3);
        assert!(found.contains(&"/about".to_string()));
        assert!(found.contains(&"https://cdn.external.test/a.js".to_string()));
        assert!(found.contains(&"/api/v1/items".to_string()));
    }
}
