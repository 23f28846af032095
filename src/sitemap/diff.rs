//! Set comparison of two sitemaps by location

use super::Sitemap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Locations added, removed and kept between two sitemaps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitemapDiff {
    /// In the new sitemap only, in its order
    pub added: Vec<String>,
    /// In the old sitemap only, in its order
    pub removed: Vec<String>,
    /// In both, in the old sitemap's order
    pub unchanged: Vec<String>,
}

impl SitemapDiff {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty() || !self.removed.is_empty()
    }
}

/// Compare `old` against `new` by exact location string.
///
/// Each location appears at most once per output list.
pub fn diff(old: &Sitemap, new: &Sitemap) -> SitemapDiff {
    let old_locs: HashSet<&str> = old.urls.iter().map(|u| u.loc.as_str()).collect();
    let new_locs: HashSet<&str> = new.urls.iter().map(|u| u.loc.as_str()).collect();

    let mut result = SitemapDiff::default();

    let mut seen = HashSet::new();
    for url in &new.urls {
        if !old_locs.contains(url.loc.as_str()) && seen.insert(url.loc.as_str()) {
            result.added.push(url.loc.clone());
        }
    }

    seen.clear();
    for url in &old.urls {
        if !seen.insert(url.loc.as_str()) {
            continue;
        }
        if new_locs.contains(url.loc.as_str()) {
            result.unchanged.push(url.loc.clone());
        } else {
            result.removed.push(url.loc.clone());
        }
    }

    result
}
