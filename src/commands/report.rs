//! Report management commands

use crate::config::Config;
use crate::error::{Error, Result};
use crate::meta::{Entry, EntryFilter, Report, ReportFilter, ReportStore};
use chrono::DateTime;
use clap_complete::Shell;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Entries shown with `report get`
const SAMPLE_ENTRIES: i64 = 10;

/// A report with a sample of its entries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportDetails {
    #[serde(flatten)]
    pub report: Report,
    pub sample_entries: Vec<Entry>,
}

/// List one user's reports, newest first.
///
/// Without `user_id` the config's `default_user_id` is listed.
pub async fn cmd_list_reports(
    config: &Config,
    store: &dyn ReportStore,
    user_id: Option<String>,
    limit: i64,
) -> Result<Vec<Report>> {
    let user_id = user_id.unwrap_or_else(|| config.default_user_id.clone());
    info!("Listing reports for user: {}", user_id);

    store
        .list_reports(&ReportFilter {
            user_id: Some(user_id),
            limit,
            offset: 0,
        })
        .await
}

/// Fetch one report and its first entries
pub async fn cmd_get_report(store: &dyn ReportStore, report_id: &str) -> Result<ReportDetails> {
    info!("Fetching report: {}", report_id);

    let report = store
        .get_report(report_id)
        .await?
        .ok_or_else(|| Error::ReportNotFound(report_id.to_string()))?;

    let sample_entries = store
        .list_entries(&EntryFilter {
            report_id: report_id.to_string(),
            limit: Some(SAMPLE_ENTRIES),
            offset: 0,
        })
        .await?;

    Ok(ReportDetails {
        report,
        sample_entries,
    })
}

/// Delete a report and its entries
pub async fn cmd_delete_report(store: &dyn ReportStore, report_id: &str) -> Result<()> {
    info!("Deleting report: {}", report_id);

    if !store.delete_report(report_id).await? {
        return Err(Error::ReportNotFound(report_id.to_string()));
    }
    Ok(())
}

/// Render an RFC 3339 timestamp with `format`, or pass it through unchanged
fn format_timestamp(value: &str, format: &str) -> String {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.format(format).to_string())
        .unwrap_or_else(|_| value.to_string())
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let kept: String = value.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Print reports table to console
pub fn print_reports(reports: &[Report]) {
    if reports.is_empty() {
        println!("No reports found. Use 'sitemapper track' to save a snapshot.");
        return;
    }

    println!("\nFound {} report(s):\n", reports.len());
    println!(
        "{:<36}  {:<15}  {:>6}  {:>6}  {:>7}  {}",
        "ID", "User ID", "URLs", "Valid", "Invalid", "Created"
    );

    for report in reports {
        println!(
            "{:<36}  {:<15}  {:>6}  {:>6}  {:>7}  {}",
            report.id,
            truncate(&report.user_id, 15),
            report.entry_count,
            report.valid_entry_count,
            report.invalid_entry_count,
            format_timestamp(&report.created_at, "%Y-%m-%d %H:%M")
        );
        if let Some(name) = report.name.as_deref() {
            println!("  Name: {}", name);
        }
    }

    println!("\nTotal: {} report(s)", reports.len());
}

/// Print report details to console
pub fn print_report_details(details: &ReportDetails) {
    let report = &details.report;

    println!("\nReport Details:");
    println!("  ID:                {}", report.id);
    println!("  User ID:           {}", report.user_id);
    if let Some(name) = report.name.as_deref() {
        println!("  Name:              {}", name);
    }
    if let Some(source) = report.source.as_deref() {
        println!("  Source:            {}", source);
    }

    println!("\nEntry Counts:");
    println!("  Total Entries:     {}", report.entry_count);
    println!("  Stored Entries:    {}", report.stored_entry_count);
    println!("  Valid Entries:     {}", report.valid_entry_count);
    println!("  Invalid Entries:   {}", report.invalid_entry_count);
    if report.live_entry_count > 0 || report.down_entry_count > 0 {
        println!("  Live Entries:      {}", report.live_entry_count);
        println!("  Down Entries:      {}", report.down_entry_count);
    }

    println!("\nGrouping:");
    println!("  Grouping Count:    {}", report.grouping_count);
    println!("  Ungrouped Count:   {}", report.ungrouped_count);

    if report.child_sitemap_count > 0 {
        println!("\nStructure:");
        println!("  Child Sitemaps:    {}", report.child_sitemap_count);
    }

    println!("\nSampling:");
    println!("  Fully Stored:      {}", report.is_fully_stored);
    println!("  Sampling Strategy: {}", report.sampling_strategy);
    if let Some(rate) = report.sampling_rate {
        println!("  Sampling Rate:     {:.2}%", rate * 100.0);
    }

    println!("\nTimestamps:");
    println!(
        "  Created:           {}",
        format_timestamp(&report.created_at, "%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated:           {}",
        format_timestamp(&report.updated_at, "%Y-%m-%d %H:%M:%S")
    );

    if !details.sample_entries.is_empty() {
        println!(
            "\nSample Entries (first {}):\n",
            details.sample_entries.len()
        );
        for entry in &details.sample_entries {
            let valid = if entry.is_valid { "✓" } else { "✗" };
            println!("  {} {} [{}]", valid, truncate(&entry.url, 70), entry.entry_type);
            if let Some(error) = entry.validation_error.as_deref() {
                println!("      {}", error);
            }
        }
    }
    println!();
}

/// Print report IDs with descriptions for shell completions
pub fn print_report_completions(reports: &[Report], shell: Shell) {
    for report in reports {
        let label = report
            .name
            .as_deref()
            .or(report.source.as_deref())
            .unwrap_or(&report.user_id);
        let description = format!(
            "{} ({} URLs), Created {}",
            label, report.entry_count, report.created_at
        )
        .replace('\n', " ");

        match shell {
            Shell::Zsh => println!("{}:{}", report.id, description.replace(':', "\\:")),
            Shell::Fish => println!("{}\t{}", report.id, description.replace('\t', " ")),
            _ => println!("{}", report.id),
        }
    }
}
