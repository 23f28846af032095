//! SQLite report store

use super::{Entry, EntryFilter, Report, ReportFilter, ReportStore, StoreTransaction, SCHEMA_SQL};
use crate::config::StorageBackend;
use crate::error::Result;
use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, Transaction};
use std::path::Path;
use tracing::{debug, info};

/// Report database handle
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `db_path`
    pub async fn connect(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        if !store.is_initialized().await? {
            store.init_schema().await?;
        }
        Ok(store)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Check if database is initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name='reports'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(result.is_some())
    }
}

#[async_trait]
impl ReportStore for SqliteStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Sqlite
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteTransaction { tx }))
    }

    async fn get_report(&self, id: &str) -> Result<Option<Report>> {
        let report = sqlx::query_as::<_, Report>("SELECT * FROM reports WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(report)
    }

    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>> {
        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT * FROM reports
            WHERE (?1 IS NULL OR user_id = ?1)
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2 OFFSET ?3
            "#,
        )
        .bind(&filter.user_id)
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(reports)
    }

    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>> {
        let entries = sqlx::query_as::<_, Entry>(
            "SELECT * FROM entries WHERE report_id = ? ORDER BY position LIMIT ? OFFSET ?",
        )
        .bind(&filter.report_id)
        // SQLite treats a negative limit as unbounded
        .bind(filter.limit.unwrap_or(-1))
        .bind(filter.offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    async fn delete_report(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM entries WHERE report_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM reports WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Open SQLite transaction; sqlx rolls it back on drop
pub struct SqliteTransaction {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl StoreTransaction for SqliteTransaction {
    async fn create_report(&mut self, report: &Report) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reports (
                id, user_id, name, source,
                entry_count, stored_entry_count, valid_entry_count, invalid_entry_count,
                live_entry_count, down_entry_count, grouping_count, ungrouped_count,
                child_sitemap_count, is_fully_stored, sampling_strategy, sampling_rate,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.id)
        .bind(&report.user_id)
        .bind(&report.name)
        .bind(&report.source)
        .bind(report.entry_count)
        .bind(report.stored_entry_count)
        .bind(report.valid_entry_count)
        .bind(report.invalid_entry_count)
        .bind(report.live_entry_count)
        .bind(report.down_entry_count)
        .bind(report.grouping_count)
        .bind(report.ungrouped_count)
        .bind(report.child_sitemap_count)
        .bind(report.is_fully_stored)
        .bind(&report.sampling_strategy)
        .bind(report.sampling_rate)
        .bind(&report.created_at)
        .bind(&report.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn create_entry(&mut self, entry: &Entry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO entries (
                id, report_id, position, grouping_id, entry_type, url,
                last_modified, change_freq, priority, is_valid, validation_error,
                http_status_code, is_live, response_time_ms, liveness_checked_at,
                liveness_error, selection_reason, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.report_id)
        .bind(entry.position)
        .bind(&entry.grouping_id)
        .bind(&entry.entry_type)
        .bind(&entry.url)
        .bind(&entry.last_modified)
        .bind(&entry.change_freq)
        .bind(entry.priority)
        .bind(entry.is_valid)
        .bind(&entry.validation_error)
        .bind(entry.http_status_code)
        .bind(entry.is_live)
        .bind(entry.response_time_ms)
        .bind(&entry.liveness_checked_at)
        .bind(&entry.liveness_error)
        .bind(&entry.selection_reason)
        .bind(&entry.created_at)
        .bind(&entry.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
