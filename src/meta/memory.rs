//! In-memory report store
//!
//! Holds everything behind one lock. Transactions buffer their writes and
//! apply them all at once on commit, so readers never see half a report.

use super::{Entry, EntryFilter, Report, ReportFilter, ReportStore, StoreTransaction};
use crate::config::StorageBackend;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    reports: HashMap<String, Report>,
    entries: HashMap<String, Entry>,
}

impl MemoryState {
    fn check_report(&self, report: &Report) -> Result<()> {
        if self.reports.contains_key(&report.id) {
            return Err(Error::Storage(format!(
                "report {} already exists",
                report.id
            )));
        }
        Ok(())
    }

    fn check_entry(&self, entry: &Entry) -> Result<()> {
        if self.entries.contains_key(&entry.id) {
            return Err(Error::Storage(format!("entry {} already exists", entry.id)));
        }
        Ok(())
    }
}

/// Negative limits mean no limit, as in SQLite
fn unbounded_if_negative(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

/// Report store kept in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Memory
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            reports: Vec::new(),
            entries: Vec::new(),
        }))
    }

    async fn get_report(&self, id: &str) -> Result<Option<Report>> {
        Ok(self.state.read().await.reports.get(id).cloned())
    }

    async fn list_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>> {
        let state = self.state.read().await;
        let mut reports: Vec<Report> = state
            .reports
            .values()
            .filter(|r| filter.user_id.as_ref().map_or(true, |u| &r.user_id == u))
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(reports
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(unbounded_if_negative(filter.limit))
            .collect())
    }

    async fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>> {
        let state = self.state.read().await;
        let mut entries: Vec<Entry> = state
            .entries
            .values()
            .filter(|e| e.report_id == filter.report_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.position);

        Ok(entries
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.map_or(usize::MAX, unbounded_if_negative))
            .collect())
    }

    async fn delete_report(&self, id: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        state.entries.retain(|_, e| e.report_id != id);
        Ok(state.reports.remove(id).is_some())
    }
}

/// Buffered writes against a [`MemoryStore`]
struct MemoryTransaction {
    state: Arc<RwLock<MemoryState>>,
    reports: Vec<Report>,
    entries: Vec<Entry>,
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn create_report(&mut self, report: &Report) -> Result<()> {
        self.state.read().await.check_report(report)?;
        if self.reports.iter().any(|r| r.id == report.id) {
            return Err(Error::Storage(format!(
                "report {} already exists",
                report.id
            )));
        }
        self.reports.push(report.clone());
        Ok(())
    }

    async fn create_entry(&mut self, entry: &Entry) -> Result<()> {
        let state = self.state.read().await;
        state.check_entry(entry)?;

        let pending_report = self.reports.iter().any(|r| r.id == entry.report_id);
        if !pending_report && !state.reports.contains_key(&entry.report_id) {
            return Err(Error::Storage(format!(
                "report {} does not exist",
                entry.report_id
            )));
        }
        if self.entries.iter().any(|e| e.id == entry.id) {
            return Err(Error::Storage(format!("entry {} already exists", entry.id)));
        }
        drop(state);

        self.entries.push(entry.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction {
            state,
            reports,
            entries,
        } = *self;
        let mut state = state.write().await;

        // Re-check against writes committed since this transaction began
        for report in &reports {
            state.check_report(report)?;
        }
        let report_ids: HashSet<&str> = reports.iter().map(|r| r.id.as_str()).collect();
        for entry in &entries {
            state.check_entry(entry)?;
            if !report_ids.contains(entry.report_id.as_str())
                && !state.reports.contains_key(&entry.report_id)
            {
                return Err(Error::Storage(format!(
                    "report {} does not exist",
                    entry.report_id
                )));
            }
        }
        drop(report_ids);

        for report in reports {
            state.reports.insert(report.id.clone(), report);
        }
        for entry in entries {
            state.entries.insert(entry.id.clone(), entry);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn insert_report(store: &MemoryStore, user: &str, urls: &[&str]) -> Report {
        let report = Report::new(user);
        let mut tx = store.begin().await.unwrap();
        tx.create_report(&report).await.unwrap();
        for (i, url) in urls.iter().enumerate() {
            tx.create_entry(&Entry::new(&report.id, i as i64, *url))
                .await
                .unwrap();
        }
        tx.commit().await.unwrap();
        report
    }

    #[tokio::test]
    async fn test_writes_visible_only_after_commit() {
        let store = MemoryStore::new();
        let report = Report::new("alice");

        let mut tx = store.begin().await.unwrap();
        tx.create_report(&report).await.unwrap();
        tx.create_entry(&Entry::new(&report.id, 0, "https://x.com/1"))
            .await
            .unwrap();
        assert!(store.get_report(&report.id).await.unwrap().is_none());

        tx.commit().await.unwrap();
        assert!(store.get_report(&report.id).await.unwrap().is_some());
        assert_eq!(
            store
                .list_entries(&EntryFilter::for_report(&report.id))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_rollback_discards_writes() {
        let store = MemoryStore::new();
        let report = Report::new("alice");

        let mut tx = store.begin().await.unwrap();
        tx.create_report(&report).await.unwrap();
        let entry = Entry::new(&report.id, 0, "https://x.com/1");
        tx.create_entry(&entry).await.unwrap();
        assert!(matches!(
            tx.create_entry(&entry).await,
            Err(Error::Storage(_))
        ));
        tx.rollback().await.unwrap();

        assert!(store.get_report(&report.id).await.unwrap().is_none());
        assert!(store
            .list_entries(&EntryFilter::for_report(&report.id))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_entry_requires_report() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = tx
            .create_entry(&Entry::new("missing", 0, "https://x.com/1"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let store = MemoryStore::new();
        let first = insert_report(&store, "alice", &["https://x.com/b", "https://x.com/a"]).await;
        insert_report(&store, "bob", &["https://x.com/c"]).await;

        let alice = store
            .list_reports(&ReportFilter {
                user_id: Some("alice".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].id, first.id);

        let entries = store
            .list_entries(&EntryFilter::for_report(&first.id))
            .await
            .unwrap();
        let urls: Vec<_> = entries.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["https://x.com/b", "https://x.com/a"]);

        let unbounded = store
            .list_reports(&ReportFilter {
                limit: -1,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(unbounded.len(), 2);
        let none = store
            .list_reports(&ReportFilter {
                limit: 0,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(none.is_empty());

        assert!(store.delete_report(&first.id).await.unwrap());
        assert!(!store.delete_report(&first.id).await.unwrap());
        assert_eq!(
            store.list_reports(&ReportFilter::default()).await.unwrap().len(),
            1
        );
        assert!(store
            .list_entries(&EntryFilter::for_report(&first.id))
            .await
            .unwrap()
            .is_empty());
    }
}
