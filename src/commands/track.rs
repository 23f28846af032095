//! Track command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::SourceReader;
use crate::meta::ReportStore;
use crate::sitemap::{self, SitemapKind};
use crate::snapshot::{self, TrackOptions};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Arguments for the track command
#[derive(Debug, Clone, Default)]
pub struct TrackArgs {
    pub source: String,
    pub name: Option<String>,
    /// Owner; falls back to `default_user_id`
    pub user_id: Option<String>,
}

/// Summary of a saved snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSummary {
    pub report_id: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub user_id: String,
    pub url_count: i64,
    pub valid_count: i64,
    pub invalid_count: i64,
    pub created_at: String,
}

/// Read a sitemap and save it as a snapshot
pub async fn cmd_track(
    config: &Config,
    store: &dyn ReportStore,
    reader: &SourceReader,
    args: TrackArgs,
) -> Result<TrackSummary> {
    let user_id = args
        .user_id
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| config.default_user_id.clone());

    info!("Tracking sitemap from: {}", args.source);

    let data = reader.read(&args.source).await?;
    let kind = sitemap::detect_type(&data)?;
    if kind != SitemapKind::Sitemap {
        return Err(Error::Parse(format!(
            "only regular sitemaps are supported for tracking, got: {}",
            kind
        )));
    }

    let parsed = sitemap::parse(&data)?;
    if let Err(e) = parsed.validate() {
        warn!("Sitemap validation warning: {}", e);
    }
    info!("Parsed {} URLs", parsed.len());

    let options = TrackOptions {
        name: args.name,
        source: Some(args.source.clone()),
    };
    let report_id = snapshot::track(store, &parsed, &user_id, &options).await?;

    let report = store
        .get_report(&report_id)
        .await?
        .ok_or_else(|| Error::ReportNotFound(report_id.clone()))?;

    Ok(TrackSummary {
        report_id,
        source: args.source,
        name: report.name,
        user_id,
        url_count: report.entry_count,
        valid_count: report.valid_entry_count,
        invalid_count: report.invalid_entry_count,
        created_at: report.created_at,
    })
}

/// Print snapshot details to console
pub fn print_track_summary(summary: &TrackSummary) {
    println!("✓ Snapshot saved with ID: {}", summary.report_id);
    println!("\nSnapshot Details:");
    println!("  Report ID: {}", summary.report_id);
    println!("  Source:    {}", summary.source);
    if let Some(name) = summary.name.as_deref() {
        println!("  Name:      {}", name);
    }
    println!("  User ID:   {}", summary.user_id);
    println!(
        "  URLs:      {} ({} valid, {} invalid)",
        summary.url_count, summary.valid_count, summary.invalid_count
    );
    println!("  Created:   {}", summary.created_at);
    println!(
        "\nUse 'sitemapper report get {}' to view this report",
        summary.report_id
    );
}
