//! URL helpers for web crawls
//!
//! The engine itself treats locations as opaque; these helpers are used by
//! `Location::parse_url` and the HTML link extractor.

mod domain;
mod normalize;

pub use domain::{extract_domain, same_domain};
pub use normalize::normalize_url;
