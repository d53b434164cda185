//! URL checks and relationship link resolution.
//!
//! Cache keys are the exact URL strings callers pass in, so nothing here
//! rewrites a URL; [`validate`] only rejects what the HTTP client can't fetch.

/// Error type for URL validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse an absolute http(s) URL.
///
/// Unlike a canonicalizer this never defaults a scheme, lowercases hosts or
/// drops fragments: `a?x=1&y=2` and `a?y=2&x=1` stay distinct.
pub fn validate(input: &str) -> Result<::url::Url, UrlError> {
    if input.trim().is_empty() {
        return Err(UrlError::Empty);
    }

    let parsed = ::url::Url::parse(input).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
}

/// Turn a relationship id such as `/rise/api/catalog-item/128562` into an
/// absolute URL on `base_url`.
pub fn resolve_relationship(base_url: &str, id: &str) -> String {
    if id.starts_with("http://") || id.starts_with("https://") {
        return id.to_string();
    }
    format!("{}{}", base_url.trim_end_matches('/'), id)
}

/// Append a query string, choosing `?` or `&` depending on what is there.
pub fn with_query(url: &str, query: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_basic() {
        let url = validate("https://data.usbr.gov/rise/api/location").unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("data.usbr.gov"));
    }

    #[test]
    fn test_validate_empty() {
        assert!(matches!(validate("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_validate_requires_scheme() {
        assert!(matches!(validate("data.usbr.gov/rise/api"), Err(UrlError::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_unsupported_scheme() {
        assert!(matches!(validate("ftp://data.usbr.gov"), Err(UrlError::UnsupportedScheme(s)) if s == "ftp"));
    }

    #[test]
    fn test_validate_keeps_query_order() {
        let url = validate("https://data.usbr.gov/rise/api/location?page=2&itemsPerPage=100").unwrap();
        assert_eq!(url.query(), Some("page=2&itemsPerPage=100"));
    }

    #[test]
    fn test_resolve_relationship() {
        assert_eq!(
            resolve_relationship("https://data.usbr.gov", "/rise/api/catalog-item/128562"),
            "https://data.usbr.gov/rise/api/catalog-item/128562"
        );
        assert_eq!(
            resolve_relationship("https://data.usbr.gov/", "/rise/api/catalog-item/1"),
            "https://data.usbr.gov/rise/api/catalog-item/1"
        );
        assert_eq!(
            resolve_relationship("https://data.usbr.gov", "https://mirror.example/rise/api/catalog-item/1"),
            "https://mirror.example/rise/api/catalog-item/1"
        );
    }

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("https://a.example/loc", "page=1"), "https://a.example/loc?page=1");
        assert_eq!(with_query("https://a.example/loc?id=3", "page=1"), "https://a.example/loc?id=3&page=1");
    }
}
