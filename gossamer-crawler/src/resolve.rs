//! Candidate resolution and internal/external classification.

use url::Url;

/// A candidate resolved to an absolute address and classified against the
/// crawl seed's authority.
#[derive(Debug, Clone)]
pub struct ResolvedLink {
    pub url: Url,
    pub external: bool,
}

/// References that name a scheme or target we never fetch.
fn is_pseudo_reference(candidate: &str) -> bool {
    candidate.is_empty()
        || candidate.starts_with('#')
        || candidate.starts_with("javascript:")
        || candidate.starts_with("mailto:")
        || candidate.starts_with("tel:")
        || candidate.starts_with("data:")
}

/// Resolve `candidate` against the page it was found on and classify it
/// relative to the seed. Malformed or non-HTTP candidates resolve to
/// `None` and are dropped by the caller without counting as errors.
pub fn resolve_candidate(base: &Url, seed: &Url, candidate: &str) -> Option<ResolvedLink> {
    if is_pseudo_reference(candidate) {
        return None;
    }

    let mut resolved = base.join(candidate).ok()?;
    resolved.set_fragment(None);
    if !matches!(resolved.scheme(), "http" | "https") {
        return None;
    }

    let external = !same_authority(&resolved, seed);
    Some(ResolvedLink {
        url: resolved,
        external,
    })
}

/// Exact host (and port, when present) comparison. No subdomain folding:
/// `sub.a.com` is external to `a.com`.
pub fn same_authority(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port() == b.port()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn same_authority_link_is_internal() {
        let seed = url("https://a.com/");
        let link = resolve_candidate(&seed, &seed, "/x").unwrap();
        assert_eq!(link.url.as_str(), "https://a.com/x");
        assert!(!link.external);
    }

    #[test]
    fn foreign_authority_link_is_external() {
        let seed = url("https://a.com/");
        let link = resolve_candidate(&seed, &seed, "https://b.com/x").unwrap();
        assert!(link.external);
    }

    #[test]
    fn subdomain_is_external() {
        let seed = url("https://a.com/");
        let link = resolve_candidate(&seed, &seed, "https://www.a.com/x").unwrap();
        assert!(link.external);
    }

    #[test]
    fn differing_port_is_external() {
        let seed = url("http://a.com:8080/");
        let link = resolve_candidate(&seed, &seed, "http://a.com:9090/x").unwrap();
        assert!(link.external);
    }

    #[test]
    fn relative_reference_resolves_against_page_not_seed() {
        let seed = url("https://a.com/");
        let page = url("https://a.com/docs/intro");
        let link = resolve_candidate(&page, &seed, "next").unwrap();
        assert_eq!(link.url.as_str(), "https://a.com/docs/next");
        assert!(!link.external);
    }

    #[test]
    fn fragment_is_stripped() {
        let seed = url("https://a.com/");
        let link = resolve_candidate(&seed, &seed, "/page#section").unwrap();
        assert_eq!(link.url.as_str(), "https://a.com/page");
    }

    #[test]
    fn pseudo_references_are_discarded() {
        let seed = url("https://a.com/");
        for candidate in ["#top", "javascript:void(0)", "mailto:x@a.com", "tel:123", ""] {
            assert!(resolve_candidate(&seed, &seed, candidate).is_none());
        }
    }

    #[test]
    fn malformed_candidate_is_discarded() {
        let seed = url("https://a.com/");
        assert!(resolve_candidate(&seed, &seed, "http://[broken").is_none());
    }

    #[test]
    fn non_http_scheme_is_discarded() {
        let seed = url("https://a.com/");
        assert!(resolve_candidate(&seed, &seed, "ftp://a.com/file").is_none());
    }
}
