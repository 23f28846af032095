//! Sitemap documents: parsing, validation and comparison
//!
//! Supports:
//! - Standard sitemap files (`<urlset>`)
//! - Sitemap index files (`<sitemapindex>`), for type routing and display
//! - Protocol validation of individual URL entries and whole sitemaps
//! - Set comparison of two sitemaps by location

mod diff;
mod parser;
mod validator;

pub use diff::*;
pub use parser::*;
pub use validator::*;

use serde::{Deserialize, Serialize};

/// A URL entry from a sitemap
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlEntry {
    /// The page URL
    pub loc: String,
    /// Last modification time, as written in the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
    /// Change frequency, as written in the document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changefreq: Option<String>,
    /// Priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
}

impl UrlEntry {
    pub fn new(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            ..Default::default()
        }
    }
}

/// A flat sitemap: ordered URL entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sitemap {
    pub urls: Vec<UrlEntry>,
}

impl Sitemap {
    pub fn new(urls: Vec<UrlEntry>) -> Self {
        Self { urls }
    }

    /// Build a sitemap from bare locations
    pub fn from_locations<I, S>(locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            urls: locations.into_iter().map(UrlEntry::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Validate the whole sitemap (all-or-nothing)
    pub fn validate(&self) -> std::result::Result<(), crate::error::ValidationError> {
        validate(Some(self))
    }

    /// Count populated optional fields
    pub fn stats(&self) -> SitemapStats {
        let mut stats = SitemapStats {
            total_urls: self.urls.len(),
            ..Default::default()
        };
        for url in &self.urls {
            if url.lastmod.as_deref().is_some_and(|s| !s.is_empty()) {
                stats.with_lastmod += 1;
            }
            // A zero priority is never persisted, so it is not counted either
            if url.priority.is_some_and(|p| p != 0.0) {
                stats.with_priority += 1;
            }
            if url.changefreq.as_deref().is_some_and(|s| !s.is_empty()) {
                stats.with_changefreq += 1;
            }
        }
        stats
    }
}

/// A child sitemap reference in a sitemap index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapRef {
    pub loc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
}

/// A sitemap index: ordered child sitemap references
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapIndex {
    pub sitemaps: Vec<SitemapRef>,
}

/// Document shape, decided by the root element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SitemapKind {
    Sitemap,
    Index,
}

impl std::fmt::Display for SitemapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SitemapKind::Sitemap => write!(f, "sitemap"),
            SitemapKind::Index => write!(f, "index"),
        }
    }
}

/// Field coverage of a sitemap
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapStats {
    pub total_urls: usize,
    pub with_lastmod: usize,
    pub with_priority: usize,
    pub with_changefreq: usize,
}
