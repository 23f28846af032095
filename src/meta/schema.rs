//! SQLite schema definition

/// SQL schema for the report database
pub const SCHEMA_SQL: &str = r#"
-- Reports: one row per tracked sitemap snapshot
CREATE TABLE IF NOT EXISTS reports (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    name TEXT,
    source TEXT,
    entry_count INTEGER NOT NULL DEFAULT 0,
    stored_entry_count INTEGER NOT NULL DEFAULT 0,
    valid_entry_count INTEGER NOT NULL DEFAULT 0,
    invalid_entry_count INTEGER NOT NULL DEFAULT 0,
    live_entry_count INTEGER NOT NULL DEFAULT 0,
    down_entry_count INTEGER NOT NULL DEFAULT 0,
    grouping_count INTEGER NOT NULL DEFAULT 0,
    ungrouped_count INTEGER NOT NULL DEFAULT 0,
    child_sitemap_count INTEGER NOT NULL DEFAULT 0,
    is_fully_stored INTEGER NOT NULL DEFAULT 1,
    sampling_strategy TEXT NOT NULL DEFAULT 'none',
    sampling_rate REAL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Entries: the URLs of a snapshot, in source order
CREATE TABLE IF NOT EXISTS entries (
    id TEXT PRIMARY KEY,
    report_id TEXT NOT NULL REFERENCES reports(id),
    position INTEGER NOT NULL,
    grouping_id TEXT,
    entry_type TEXT NOT NULL DEFAULT 'url',
    url TEXT NOT NULL,
    last_modified TEXT,
    change_freq TEXT,
    priority REAL,
    is_valid INTEGER NOT NULL,
    validation_error TEXT,
    http_status_code INTEGER,
    is_live INTEGER,
    response_time_ms INTEGER,
    liveness_checked_at TEXT,
    liveness_error TEXT,
    selection_reason TEXT NOT NULL DEFAULT 'full_storage',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reports_user ON reports(user_id, created_at);
CREATE INDEX IF NOT EXISTS idx_entries_report ON entries(report_id, position);
"#;
