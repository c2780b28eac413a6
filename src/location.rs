//! Location and content types
//!
//! A [`Location`] is the unit of crawlable work. The engine treats it as an
//! opaque, hashable identifier; the URL helpers here only exist so callers
//! crawling the web can build normalized locations.

use crate::url::normalize_url;
use crate::{ConfigError, UrlError};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// An opaque, immutable identifier for a unit of crawlable work
///
/// Cloning is cheap: the underlying string is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location(Arc<str>);

impl Location {
    /// Creates a location from a raw identifier
    ///
    /// Surrounding whitespace is trimmed. Blank identifiers are rejected.
    ///
    /// # Examples
    ///
    /// ```
    /// use tidepool::Location;
    ///
    /// let location = Location::new("  A ").unwrap();
    /// assert_eq!(location.as_str(), "A");
    /// assert!(Location::new("   ").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ConfigError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MalformedLocation(raw.as_ref().to_string()));
        }
        Ok(Self(Arc::from(trimmed)))
    }

    /// Creates a location from an already-parsed URL
    pub fn from_url(url: &Url) -> Self {
        Self(Arc::from(url.as_str()))
    }

    /// Parses and normalizes a URL string into a location
    ///
    /// # Examples
    ///
    /// ```
    /// use tidepool::Location;
    ///
    /// let location = Location::parse_url("https://WWW.Example.com/a/?utm_source=x").unwrap();
    /// assert_eq!(location.as_str(), "https://example.com/a");
    /// ```
    pub fn parse_url(raw: &str) -> Result<Self, UrlError> {
        let url = normalize_url(raw)?;
        Ok(Self::from_url(&url))
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interprets the location as a URL, if it is one
    pub fn to_url(&self) -> Option<Url> {
        Url::parse(&self.0).ok()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Location {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&Url> for Location {
    fn from(url: &Url) -> Self {
        Self::from_url(url)
    }
}

/// The payload fetched for a location
///
/// Content is immutable once created. It optionally remembers the URL it was
/// served from, so extractors can resolve relative links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    body: Arc<str>,
    source: Option<Url>,
}

impl Content {
    /// Creates content with no source URL
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: Arc::from(body.into()),
            source: None,
        }
    }

    /// Creates content that remembers the URL it was fetched from
    pub fn with_source(body: impl Into<String>, source: Url) -> Self {
        Self {
            body: Arc::from(body.into()),
            source: Some(source),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn source(&self) -> Option<&Url> {
        self.source.as_ref()
    }

    /// Size of the body in bytes
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

impl From<&str> for Content {
    fn from(body: &str) -> Self {
        Self::new(body)
    }
}

impl From<String> for Content {
    fn from(body: String) -> Self {
        Self::new(body)
    }
}
