use url::Url;

/// Extracts the lowercase host of a URL
///
/// Ports are not part of the domain.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use tidepool::url::extract_domain;
///
/// let url = Url::parse("https://Docs.Example.com:8443/guide").unwrap();
/// assert_eq!(extract_domain(&url), Some("docs.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns true if both URLs share the same domain
///
/// URLs without a host never match anything.
pub fn same_domain(a: &Url, b: &Url) -> bool {
    match (extract_domain(a), extract_domain(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}
