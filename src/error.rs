//! Custom error types for sitemapper

use thiserror::Error;

/// Main error type for sitemapper operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Sitemap protocol violations.
///
/// Entry-level variants are produced by `validate_url`; the others come from
/// the sitemap-level check, which wraps the first failing entry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("no sitemap provided")]
    NoSitemap,

    #[error("sitemap contains no URLs")]
    Empty,

    #[error("invalid URL at index {index}: {source}")]
    InvalidEntry {
        index: usize,
        #[source]
        source: Box<ValidationError>,
    },

    #[error("missing <loc> element")]
    MissingLocation,

    #[error("invalid URL format: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("priority must be between 0.0 and 1.0, got {0:.6}")]
    PriorityOutOfRange(f64),

    #[error("invalid changefreq value: {0}")]
    InvalidChangeFreq(String),
}

/// Result type alias for sitemapper
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Short category name, prefixed to the fatal error log line
    pub fn category(&self) -> &'static str {
        match self {
            Error::Io(_) | Error::Fetch(_) | Error::Http(_) => "io",
            Error::Parse(_) | Error::UrlParse(_) | Error::Json(_) => "parse",
            Error::Validation(_) => "validation",
            Error::Storage(_) | Error::Database(_) | Error::ReportNotFound(_) => "storage",
            Error::Config(_) | Error::TomlParse(_) | Error::TomlSerialize(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_entry_message_includes_index_and_cause() {
        let err = ValidationError::InvalidEntry {
            index: 3,
            source: Box::new(ValidationError::PriorityOutOfRange(1.5)),
        };
        assert_eq!(
            err.to_string(),
            "invalid URL at index 3: priority must be between 0.0 and 1.0, got 1.500000"
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(Error::Fetch("boom".to_string()).category(), "io");
        assert_eq!(Error::Parse("bad".to_string()).category(), "parse");
        assert_eq!(Error::from(ValidationError::Empty).category(), "validation");
        assert_eq!(Error::Storage("disk".to_string()).category(), "storage");
    }
}
