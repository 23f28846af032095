//! sitemapper: parse, validate, track and compare XML sitemaps
//!
//! Sitemaps are read from local files or HTTP(S) URLs, decoded with a
//! streaming XML reader, checked against the sitemap protocol and stored as
//! snapshots in a report store (SQLite by default).

pub mod commands;
pub mod config;
pub mod error;
pub mod fetch;
pub mod meta;
pub mod sitemap;
pub mod snapshot;

pub use config::Config;
pub use error::{Error, Result, ValidationError};
pub use sitemap::{Sitemap, SitemapDiff, SitemapIndex, UrlEntry};
