//! URL handling for asset requests.
//!
//! Cache entries are keyed by the canonical form of a URL, so every URL
//! that reaches the cache goes through [`canonicalize`] or [`resolve`] first.

/// Error type for URL parsing and resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<UrlError> for eikan_core::Error {
    fn from(err: UrlError) -> Self {
        eikan_core::Error::InvalidUrl(err.to_string())
    }
}

/// Canonicalize an absolute URL.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Require an http(s) scheme
/// 3. Lowercase the host (done by the parser for special schemes)
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str) -> Result<url::Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = url::Url::parse(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }
    parsed.set_fragment(None);

    Ok(parsed)
}

/// Parse the application origin, making sure relative paths resolve below it.
///
/// `https://host/app` becomes `https://host/app/`.
pub fn parse_origin(input: &str) -> Result<url::Url, UrlError> {
    let mut origin = canonicalize(input)?;
    origin.set_query(None);
    if !origin.path().ends_with('/') {
        let path = format!("{}/", origin.path());
        origin.set_path(&path);
    }
    Ok(origin)
}

/// Resolve an app-relative path such as `./data/menu.json` against the origin.
pub fn resolve(origin: &url::Url, path: &str) -> Result<url::Url, UrlError> {
    let mut resolved = origin.join(path.trim()).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    resolved.set_fragment(None);
    Ok(resolved)
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &url::Url, b: &url::Url) -> bool {
    a.origin() == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize("https://EIKAN.Example/index.html").unwrap();
        assert_eq!(url.host_str(), Some("eikan.example"));
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize("https://eikan.example/#menu").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.as_str(), "https://eikan.example/");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize("https://eikan.example/script.js?v=2&a=1").unwrap();
        assert_eq!(url.query(), Some("v=2&a=1"));
    }

    #[test]
    fn test_canonicalize_rejects_relative_and_other_schemes() {
        assert!(matches!(canonicalize("./index.html"), Err(UrlError::InvalidUrl(_))));
        assert!(matches!(canonicalize("file:///etc/passwd"), Err(UrlError::UnsupportedScheme(_))));
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_parse_origin_adds_trailing_slash() {
        let origin = parse_origin("https://eikan.example/app").unwrap();
        assert_eq!(origin.as_str(), "https://eikan.example/app/");

        let root = parse_origin("http://localhost:8080").unwrap();
        assert_eq!(root.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_resolve_manifest_paths() {
        let origin = parse_origin("https://eikan.example/app/").unwrap();
        assert_eq!(resolve(&origin, "./").unwrap().as_str(), "https://eikan.example/app/");
        assert_eq!(resolve(&origin, "./index.html").unwrap().as_str(), "https://eikan.example/app/index.html");
        assert_eq!(
            resolve(&origin, "./data/menu.json").unwrap().as_str(),
            "https://eikan.example/app/data/menu.json"
        );
    }

    #[test]
    fn test_same_origin() {
        let origin = parse_origin("https://eikan.example/").unwrap();
        let asset = canonicalize("https://eikan.example/style.css").unwrap();
        let cdn = canonicalize("https://cdn.example/html2canvas.min.js").unwrap();
        let other_port = canonicalize("https://eikan.example:8443/").unwrap();

        assert!(same_origin(&origin, &asset));
        assert!(!same_origin(&origin, &cdn));
        assert!(!same_origin(&origin, &other_port));
    }
}
