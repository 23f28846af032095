//! Compare command implementation

use crate::error::Result;
use crate::fetch::SourceReader;
use crate::meta::ReportStore;
use crate::sitemap::{self, Sitemap};
use crate::snapshot;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const CHANGE_DISPLAY_LIMIT: usize = 20;
const UNCHANGED_DISPLAY_LIMIT: usize = 10;

/// Outcome of comparing two sources
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareReport {
    pub source1: String,
    pub source2: String,
    pub source1_url_count: usize,
    pub source2_url_count: usize,
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub has_changes: bool,
    pub added_urls: Vec<String>,
    pub removed_urls: Vec<String>,
    /// Present only when unchanged URLs were requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unchanged_urls: Option<Vec<String>>,
}

/// Compare two sources, each a stored report id, a file path or a URL
pub async fn cmd_compare(
    store: &dyn ReportStore,
    reader: &SourceReader,
    source1: &str,
    source2: &str,
    show_unchanged: bool,
) -> Result<CompareReport> {
    info!("Comparing: {} vs {}", source1, source2);

    let (old, label1) = load_sitemap(store, reader, source1).await?;
    let (new, label2) = load_sitemap(store, reader, source2).await?;

    let diff = sitemap::diff(&old, &new);
    info!(
        "Comparison complete: {} added, {} removed, {} unchanged",
        diff.added.len(),
        diff.removed.len(),
        diff.unchanged.len()
    );

    Ok(CompareReport {
        source1: label1,
        source2: label2,
        source1_url_count: old.len(),
        source2_url_count: new.len(),
        added: diff.added.len(),
        removed: diff.removed.len(),
        unchanged: diff.unchanged.len(),
        has_changes: diff.has_changes(),
        added_urls: diff.added,
        removed_urls: diff.removed,
        unchanged_urls: show_unchanged.then_some(diff.unchanged),
    })
}

/// Resolve a source to a sitemap plus a display label.
///
/// Stored reports take precedence over paths and URLs.
async fn load_sitemap(
    store: &dyn ReportStore,
    reader: &SourceReader,
    source: &str,
) -> Result<(Sitemap, String)> {
    match store.get_report(source).await {
        Ok(Some(_)) => {
            let sitemap = snapshot::load_snapshot(store, source).await?;
            return Ok((sitemap, format!("Report: {}", source)));
        }
        Ok(None) => {}
        Err(e) => debug!("Report lookup for {} failed: {}", source, e),
    }

    let data = reader.read(source).await?;
    let sitemap = sitemap::parse(&data)?;
    Ok((sitemap, source.to_string()))
}

/// Print comparison results to console
pub fn print_compare_report(report: &CompareReport) {
    println!("\nComparison Results:");
    println!(
        "  Source 1: {} ({} URLs)",
        report.source1, report.source1_url_count
    );
    println!(
        "  Source 2: {} ({} URLs)",
        report.source2, report.source2_url_count
    );
    println!();
    println!("  Added:     {} URLs", report.added);
    println!("  Removed:   {} URLs", report.removed);
    println!("  Unchanged: {} URLs", report.unchanged);
    println!();

    if !report.has_changes {
        println!("No URLs added or removed.\n");
    }

    print_url_list("Added URLs:", '+', &report.added_urls, CHANGE_DISPLAY_LIMIT);
    print_url_list("Removed URLs:", '-', &report.removed_urls, CHANGE_DISPLAY_LIMIT);

    if let Some(unchanged) = &report.unchanged_urls {
        print_url_list(
            &format!("Unchanged URLs (first {}):", UNCHANGED_DISPLAY_LIMIT),
            '=',
            unchanged,
            UNCHANGED_DISPLAY_LIMIT,
        );
    }

    println!("✓ Comparison complete");
}

fn print_url_list(title: &str, marker: char, urls: &[String], limit: usize) {
    if urls.is_empty() {
        return;
    }

    println!("{}", title);
    for url in urls.iter().take(limit) {
        println!("  {} {}", marker, url);
    }
    if urls.len() > limit {
        println!("  ... and {} more", urls.len() - limit);
    }
    println!();
}
