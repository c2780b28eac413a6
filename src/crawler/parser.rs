//! Location extraction from fetched content
//!
//! Extractors turn content into candidate locations. The worker does all
//! deduplication; extractors may return duplicates or already-known locations.

use crate::location::{Content, Location};
use crate::url::same_domain;
use scraper::{Html, Selector};
use url::Url;

/// Produces candidate locations from fetched content
///
/// Must be deterministic for a given content. Any
/// `Fn(&Content) -> Vec<Location>` closure is an extractor.
pub trait Extractor: Send + Sync {
    fn extract(&self, content: &Content) -> Vec<Location>;
}

impl<F> Extractor for F
where
    F: Fn(&Content) -> Vec<Location> + Send + Sync,
{
    fn extract(&self, content: &Content) -> Vec<Location> {
        self(content)
    }
}

/// Extracts followable links from HTML pages
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - fragment-only links
/// - relative links when the content has no source URL
/// - links to other domains when `same_domain_only` is set
///
/// Every kept link is normalized before it becomes a location.
#[derive(Debug, Clone, Default)]
pub struct HtmlLinkExtractor {
    same_domain_only: bool,
}

impl HtmlLinkExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only links on the same domain as the page they were found on
    pub fn same_domain_only(mut self, enabled: bool) -> Self {
        self.same_domain_only = enabled;
        self
    }
}

impl Extractor for HtmlLinkExtractor {
    fn extract(&self, content: &Content) -> Vec<Location> {
        let source = content.source();
        let document = Html::parse_document(content.body());

        let mut locations = Vec::new();
        for href in extract_hrefs(&document) {
            let Some(absolute) = resolve_link(&href, source) else {
                continue;
            };

            if self.same_domain_only {
                match source {
                    Some(base) if same_domain(base, &absolute) => {}
                    _ => continue,
                }
            }

            match Location::parse_url(absolute.as_str()) {
                Ok(location) => locations.push(location),
                Err(e) => tracing::debug!("Dropping link {}: {}", absolute, e),
            }
        }

        locations
    }
}

/// Collects raw href values worth following
fn extract_hrefs(document: &Html) -> Vec<String> {
    let mut hrefs = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                hrefs.push(href.to_string());
            }
        }
    }

    if let Ok(selector) = Selector::parse("link[rel='canonical'][href]") {
        hrefs.extend(
            document
                .select(&selector)
                .filter_map(|element| element.value().attr("href"))
                .map(str::to_string),
        );
    }

    hrefs
}

/// Resolves an href to an absolute http(s) URL
///
/// Returns None for excluded schemes, fragment-only links and anything that
/// cannot be resolved.
fn resolve_link(href: &str, base: Option<&Url>) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let resolved = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };

    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(body: &str, source: &str) -> Content {
        Content::with_source(body, Url::parse(source).unwrap())
    }

    fn strings(locations: Vec<Location>) -> Vec<String> {
        locations.into_iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_resolves_relative_links() {
        let content = page(
            r#"<html><body>
                <a href="/about">About</a>
                <a href="team/">Team</a>
                <a href="https://other.org/x">Other</a>
            </body></html>"#,
            "https://example.com/company/",
        );

        let links = strings(HtmlLinkExtractor::new().extract(&content));
        assert_eq!(
            links,
            vec![
                "https://example.com/about",
                "https://example.com/company/team",
                "https://other.org/x",
            ]
        );
    }

    #[test]
    fn test_skips_excluded_links() {
        let content = page(
            r##"<html><body>
                <a href="javascript:void(0)">js</a>
                <a href="mailto:a@example.com">mail</a>
                <a href="TEL:123">tel</a>
                <a href="#top">anchor</a>
                <a href="/file.zip" download>zip</a>
                <a href="ftp://example.com/f">ftp</a>
                <a href="/kept">kept</a>
            </body></html>"##,
            "https://example.com/",
        );

        let links = strings(HtmlLinkExtractor::new().extract(&content));
        assert_eq!(links, vec!["https://example.com/kept"]);
    }

    #[test]
    fn test_canonical_link_included() {
        let content = page(
            r#"<html><head><link rel="canonical" href="https://example.com/canon"></head></html>"#,
            "https://example.com/page?x=1",
        );

        let links = strings(HtmlLinkExtractor::new().extract(&content));
        assert_eq!(links, vec!["https://example.com/canon"]);
    }

    #[test]
    fn test_relative_links_need_a_source() {
        let content = Content::new(r#"<a href="/rel">r</a><a href="https://abs.com/">a</a>"#);
        let links = strings(HtmlLinkExtractor::new().extract(&content));
        assert_eq!(links, vec!["https://abs.com/"]);
    }

    #[test]
    fn test_same_domain_only() {
        let content = page(
            r#"<a href="/inside">in</a><a href="https://elsewhere.net/">out</a>"#,
            "https://example.com/",
        );

        let links = strings(
            HtmlLinkExtractor::new()
                .same_domain_only(true)
                .extract(&content),
        );
        assert_eq!(links, vec!["https://example.com/inside"]);
    }

    #[test]
    fn test_closure_extractor() {
        let extractor = |content: &Content| {
            content
                .body()
                .split(',')
                .filter_map(|part| Location::new(part).ok())
                .collect::<Vec<_>>()
        };

        let found = extractor.extract(&Content::new("B, C,"));
        assert_eq!(strings(found), vec!["B", "C"]);
    }
}
