//! Snapshot tracking
//!
//! Turns a parsed sitemap into a persisted report plus one entry per URL,
//! written in a single transaction, and rebuilds sitemaps from stored
//! reports for comparison.

use crate::error::{Error, Result};
use crate::meta::{Entry, EntryFilter, Report, ReportStore, StoreTransaction};
use crate::sitemap::{validate_url, Sitemap, UrlEntry};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

/// Optional metadata recorded with a snapshot
#[derive(Debug, Clone, Default)]
pub struct TrackOptions {
    /// Human-readable snapshot name
    pub name: Option<String>,
    /// Path or URL the sitemap was read from
    pub source: Option<String>,
}

/// Persist `sitemap` as a new report owned by `user_id`.
///
/// Every entry is stored, valid or not; per-entry validation failures are
/// recorded on the entry. Returns the new report id.
pub async fn track(
    store: &dyn ReportStore,
    sitemap: &Sitemap,
    user_id: &str,
    options: &TrackOptions,
) -> Result<String> {
    let mut report = Report::new(user_id);
    report.name = options.name.clone().filter(|n| !n.is_empty());
    report.source = options.source.clone();

    let entries: Vec<Entry> = sitemap
        .urls
        .iter()
        .enumerate()
        .map(|(position, url)| build_entry(&report.id, position as i64, url))
        .collect();

    let total = entries.len() as i64;
    let valid = entries.iter().filter(|e| e.is_valid).count() as i64;
    report.entry_count = total;
    report.stored_entry_count = total;
    report.valid_entry_count = valid;
    report.invalid_entry_count = total - valid;
    report.ungrouped_count = total;

    info!(
        "Saving snapshot {} ({} entries, {} invalid)",
        report.id, total, report.invalid_entry_count
    );

    let mut tx = store
        .begin()
        .await
        .map_err(|e| Error::Storage(format!("failed to begin transaction: {}", e)))?;

    if let Err(e) = write_snapshot(tx.as_mut(), &report, &entries).await {
        if let Err(rollback_err) = tx.rollback().await {
            warn!("Rollback of snapshot {} failed: {}", report.id, rollback_err);
        }
        return Err(e);
    }

    tx.commit()
        .await
        .map_err(|e| Error::Storage(format!("failed to commit transaction: {}", e)))?;

    debug!("Committed snapshot {}", report.id);
    Ok(report.id)
}

async fn write_snapshot(
    tx: &mut dyn StoreTransaction,
    report: &Report,
    entries: &[Entry],
) -> Result<()> {
    tx.create_report(report)
        .await
        .map_err(|e| Error::Storage(format!("failed to create report: {}", e)))?;

    for entry in entries {
        tx.create_entry(entry)
            .await
            .map_err(|e| Error::Storage(format!("failed to create entry: {}", e)))?;
    }
    Ok(())
}

fn build_entry(report_id: &str, position: i64, url: &UrlEntry) -> Entry {
    let mut entry = Entry::new(report_id, position, url.loc.clone());

    entry.last_modified = url
        .lastmod
        .as_deref()
        .and_then(parse_lastmod)
        .map(|dt| dt.to_rfc3339());
    entry.change_freq = url.changefreq.clone().filter(|c| !c.is_empty());
    // Zero and absent priority are not distinguished once stored
    entry.priority = url.priority.filter(|p| *p != 0.0);

    if let Err(e) = validate_url(url) {
        entry.is_valid = false;
        entry.validation_error = Some(e.to_string());
    }

    entry
}

/// Parse a `<lastmod>` value.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SSZ`, `YYYY-MM-DDTHH:MM:SS±HH:MM`
/// and full RFC 3339 (with fractional seconds), tried in that order.
pub fn parse_lastmod(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let utc = FixedOffset::east_opt(0)?;

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0)?.and_local_timezone(utc).single();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%SZ") {
        return naive.and_local_timezone(utc).single();
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%:z") {
        return Some(dt);
    }
    DateTime::parse_from_rfc3339(value).ok()
}

/// Rebuild the sitemap stored under `report_id`, in source order
pub async fn load_snapshot(store: &dyn ReportStore, report_id: &str) -> Result<Sitemap> {
    if store.get_report(report_id).await?.is_none() {
        return Err(Error::ReportNotFound(report_id.to_string()));
    }

    let entries = store
        .list_entries(&EntryFilter::for_report(report_id))
        .await?;
    debug!("Loaded {} entries for report {}", entries.len(), report_id);

    Ok(Sitemap::new(entries.into_iter().map(entry_to_url).collect()))
}

fn entry_to_url(entry: Entry) -> UrlEntry {
    let lastmod = entry
        .last_modified
        .as_deref()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.format("%Y-%m-%d").to_string());

    UrlEntry {
        loc: entry.url,
        lastmod,
        changefreq: entry.change_freq,
        priority: entry.priority,
    }
}
