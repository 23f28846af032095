//! Report storage
//!
//! This module defines the persisted records of a tracked sitemap:
//! - Reports (one per snapshot, with aggregate counts)
//! - Entries (the URLs of a snapshot, in source order)
//!
//! Storage is a single capability, [`ReportStore`], with a SQLite backend
//! and an in-memory backend. [`open_store`] picks one from configuration.

mod memory;
mod schema;
mod sqlite;

pub use memory::MemoryStore;
pub use schema::*;
pub use sqlite::SqliteStore;

use crate::config::{Config, StorageBackend};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// How entries of a report were selected for storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingStrategy {
    None,
    Stratified,
    Random,
}

impl std::fmt::Display for SamplingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplingStrategy::None => write!(f, "none"),
            SamplingStrategy::Stratified => write!(f, "stratified"),
            SamplingStrategy::Random => write!(f, "random"),
        }
    }
}

impl FromStr for SamplingStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(SamplingStrategy::None),
            "stratified" => Ok(SamplingStrategy::Stratified),
            "random" => Ok(SamplingStrategy::Random),
            _ => Err(Error::Storage(format!("Unknown sampling strategy: {}", s))),
        }
    }
}

/// Kind of stored entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// A page URL from a sitemap
    Url,
    /// A child sitemap from a sitemap index
    Sitemap,
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryType::Url => write!(f, "url"),
            EntryType::Sitemap => write!(f, "sitemap"),
        }
    }
}

impl FromStr for EntryType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "url" => Ok(EntryType::Url),
            "sitemap" => Ok(EntryType::Sitemap),
            _ => Err(Error::Storage(format!("Unknown entry type: {}", s))),
        }
    }
}

/// Why an entry was stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    FullStorage,
    Sampled,
    Outlier,
    Boundary,
}

impl std::fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionReason::FullStorage => write!(f, "full_storage"),
            SelectionReason::Sampled => write!(f, "sampled"),
            SelectionReason::Outlier => write!(f, "outlier"),
            SelectionReason::Boundary => write!(f, "boundary"),
        }
    }
}

impl FromStr for SelectionReason {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "full_storage" => Ok(SelectionReason::FullStorage),
            "sampled" => Ok(SelectionReason::Sampled),
            "outlier" => Ok(SelectionReason::Outlier),
            "boundary" => Ok(SelectionReason::Boundary),
            _ => Err(Error::Storage(format!("Unknown selection reason: {}", s))),
        }
    }
}

/// A tracked sitemap snapshot
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Report {
    pub id: String,
    pub user_id: String,
    pub name: Option<String>,
    pub source: Option<String>,

    pub entry_count: i64,
    pub stored_entry_count: i64,
    pub valid_entry_count: i64,
    pub invalid_entry_count: i64,
    pub live_entry_count: i64,
    pub down_entry_count: i64,

    pub grouping_count: i64,
    pub ungrouped_count: i64,
    pub child_sitemap_count: i64,

    pub is_fully_stored: bool,
    pub sampling_strategy: String,
    pub sampling_rate: Option<f64>,

    pub created_at: String,
    pub updated_at: String,
}

impl Report {
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: None,
            source: None,
            entry_count: 0,
            stored_entry_count: 0,
            valid_entry_count: 0,
            invalid_entry_count: 0,
            live_entry_count: 0,
            down_entry_count: 0,
            grouping_count: 0,
            ungrouped_count: 0,
            child_sitemap_count: 0,
            is_fully_stored: true,
            sampling_strategy: SamplingStrategy::None.to_string(),
            sampling_rate: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn get_sampling_strategy(&self) -> Result<SamplingStrategy> {
        self.sampling_strategy.parse()
    }
}

/// A URL stored as part of a report
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,
    pub report_id: String,
    /// 0-based order within the source sitemap
    pub position: i64,
    pub grouping_id: Option<String>,
    pub entry_type: String,
    pub url: String,

    pub last_modified: Option<String>,
    pub change_freq: Option<String>,
    pub priority: Option<f64>,

    pub is_valid: bool,
    pub validation_error: Option<String>,

    // Liveness fields, not populated by tracking
    pub http_status_code: Option<i64>,
    pub is_live: Option<bool>,
    pub response_time_ms: Option<i64>,
    pub liveness_checked_at: Option<String>,
    pub liveness_error: Option<String>,

    pub selection_reason: String,

    pub created_at: String,
    pub updated_at: String,
}

impl Entry {
    pub fn new(report_id: impl Into<String>, position: i64, url: impl Into<String>) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            report_id: report_id.into(),
            position,
            grouping_id: None,
            entry_type: EntryType::Url.to_string(),
            url: url.into(),
            last_modified: None,
            change_freq: None,
            priority: None,
            is_valid: true,
            validation_error: None,
            http_status_code: None,
            is_live: None,
            response_time_ms: None,
            liveness_checked_at: None,
            liveness_error: None,
            selection_reason: SelectionReason::FullStorage.to_string(),
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// Filter for listing reports, newest first
#[derive(Debug, Clone)]
pub struct ReportFilter {
    pub user_id: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ReportFilter {
    fn default() -> Self {
        Self {
            user_id: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Filter for listing the entries of one report, in position order
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub report_id: String,
    /// `None` lists every entry
    pub limit: Option<i64>,
    pub offset: i64,
}

impl EntryFilter {
    pub fn for_report(report_id: impl Into<String>) -> Self {
        Self {
            report_id: report_id.into(),
            ..Default::default()
        }
    }
}

/// Storage capability for reports and their entries
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Backend behind this store
    fn backend(&self) -> StorageBackend;

    /// Start a write transaction
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;

    async fn get_report(&self, id: &str) -> Result<Option<Report>>;

    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>>;

    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>>;

    /// Delete a report and its entries. Returns false if it did not exist.
    async fn delete_report(&self, id: &str) -> Result<bool>;
}

/// A write transaction. Dropping it without `commit` discards its writes.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn create_report(&mut self, report: &Report) -> Result<()>;

    async fn create_entry(&mut self, entry: &Entry) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Open the store selected by `storage.backend`
pub async fn open_store(config: &Config) -> Result<Arc<dyn ReportStore>> {
    let backend = config.storage.backend()?;
    debug!("Opening {} report store", backend);

    let store: Arc<dyn ReportStore> = match backend {
        StorageBackend::Sqlite => Arc::new(SqliteStore::connect(&config.paths.db_file).await?),
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}
