//! Sitemap protocol validation

use super::{Sitemap, UrlEntry};
use crate::error::ValidationError;
use url::Url;

/// Allowed `<changefreq>` values (case-sensitive)
pub const CHANGE_FREQUENCIES: [&str; 7] = [
    "always", "hourly", "daily", "weekly", "monthly", "yearly", "never",
];

/// Check a whole sitemap against the protocol.
///
/// Fails on an absent or empty sitemap, or on the first entry that fails
/// [`validate_url`], reporting that entry's index.
pub fn validate(sitemap: Option<&Sitemap>) -> Result<(), ValidationError> {
    let sitemap = sitemap.ok_or(ValidationError::NoSitemap)?;

    if sitemap.urls.is_empty() {
        return Err(ValidationError::Empty);
    }

    for (index, entry) in sitemap.urls.iter().enumerate() {
        validate_url(entry).map_err(|source| ValidationError::InvalidEntry {
            index,
            source: Box::new(source),
        })?;
    }

    Ok(())
}

/// Check a single URL entry. Only the first violation is reported.
pub fn validate_url(entry: &UrlEntry) -> Result<(), ValidationError> {
    if entry.loc.is_empty() {
        return Err(ValidationError::MissingLocation);
    }

    Url::parse(&entry.loc)?;

    if let Some(priority) = entry.priority {
        if !(0.0..=1.0).contains(&priority) {
            return Err(ValidationError::PriorityOutOfRange(priority));
        }
    }

    if let Some(changefreq) = entry.changefreq.as_deref().filter(|c| !c.is_empty()) {
        if !is_valid_changefreq(changefreq) {
            return Err(ValidationError::InvalidChangeFreq(changefreq.to_string()));
        }
    }

    Ok(())
}

pub fn is_valid_changefreq(value: &str) -> bool {
    CHANGE_FREQUENCIES.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(loc: &str) -> UrlEntry {
        UrlEntry::new(loc)
    }

    #[test]
    fn test_valid_entry() {
        let url = UrlEntry {
            loc: "https://example.com/page".to_string(),
            lastmod: Some("2024-01-01".to_string()),
            changefreq: Some("weekly".to_string()),
            priority: Some(0.5),
        };
        assert!(validate_url(&url).is_ok());
    }

    #[test]
    fn test_missing_loc() {
        let err = validate_url(&entry("")).unwrap_err();
        assert_eq!(err, ValidationError::MissingLocation);
        assert_eq!(err.to_string(), "missing <loc> element");
    }

    #[test]
    fn test_invalid_url() {
        let err = validate_url(&entry("not a url")).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidUrl(_)));
        assert!(err.to_string().starts_with("invalid URL format"));

        assert!(validate_url(&entry("/relative/path")).is_err());
    }

    #[test]
    fn test_priority_bounds() {
        let mut url = entry("https://example.com/");

        for ok in [0.0, 0.5, 1.0] {
            url.priority = Some(ok);
            assert!(validate_url(&url).is_ok(), "priority {} should pass", ok);
        }

        for bad in [-0.1, 1.000_001, 1.5, f64::NAN] {
            url.priority = Some(bad);
            assert!(
                matches!(
                    validate_url(&url),
                    Err(ValidationError::PriorityOutOfRange(_))
                ),
                "priority {} should fail",
                bad
            );
        }
    }

    #[test]
    fn test_changefreq_values() {
        let mut url = entry("https://example.com/");

        for freq in CHANGE_FREQUENCIES {
            url.changefreq = Some(freq.to_string());
            assert!(validate_url(&url).is_ok());
        }

        for bad in ["Daily", "WEEKLY", "fortnightly", " daily", "   "] {
            url.changefreq = Some(bad.to_string());
            assert_eq!(
                validate_url(&url).unwrap_err(),
                ValidationError::InvalidChangeFreq(bad.to_string())
            );
        }

        // An empty value counts as unset
        url.changefreq = Some(String::new());
        assert!(validate_url(&url).is_ok());
    }

    #[test]
    fn test_first_violation_wins() {
        let url = UrlEntry {
            loc: "https://example.com/".to_string(),
            lastmod: None,
            changefreq: Some("sometimes".to_string()),
            priority: Some(2.0),
        };
        assert_eq!(
            validate_url(&url).unwrap_err(),
            ValidationError::PriorityOutOfRange(2.0)
        );
    }

    #[test]
    fn test_validate_sitemap() {
        assert_eq!(validate(None).unwrap_err(), ValidationError::NoSitemap);
        assert_eq!(
            validate(Some(&Sitemap::default())).unwrap_err(),
            ValidationError::Empty
        );

        let good = Sitemap::from_locations(["https://example.com/1", "https://example.com/2"]);
        assert!(validate(Some(&good)).is_ok());
        assert!(good.validate().is_ok());
    }

    #[test]
    fn test_validate_sitemap_reports_first_bad_index() {
        let sitemap = Sitemap::from_locations([
            "https://example.com/1",
            "https://example.com/2",
            "",
            "not a url",
        ]);

        let err = validate(Some(&sitemap)).unwrap_err();
        match &err {
            ValidationError::InvalidEntry { index, source } => {
                assert_eq!(*index, 2);
                assert_eq!(**source, ValidationError::MissingLocation);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            err.to_string(),
            "invalid URL at index 2: missing <loc> element"
        );
    }
}
