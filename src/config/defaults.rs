//! Default values for configuration

/// Default user that owns tracked snapshots
pub fn default_user_id() -> String {
    "default".to_string()
}

/// Default storage backend
pub fn default_storage_backend() -> String {
    "sqlite".to_string()
}

/// Default maximum fetch attempts per source
pub fn default_fetch_max_attempts() -> u32 {
    3
}

/// Default request timeout in seconds
pub fn default_fetch_timeout() -> u64 {
    30
}

/// Default backoff unit; attempt `n` waits `n` units before retrying
pub fn default_fetch_backoff_unit_ms() -> u64 {
    1000
}

/// Default user agent
pub fn default_fetch_user_agent() -> String {
    format!("sitemapper/{}", env!("CARGO_PKG_VERSION"))
}
