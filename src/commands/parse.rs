//! Parse command implementation

use crate::error::Result;
use crate::fetch::SourceReader;
use crate::sitemap::{self, Sitemap, SitemapIndex, SitemapKind, SitemapStats};
use serde::Serialize;
use tracing::info;

/// Number of URLs shown in console output
const SAMPLE_SIZE: usize = 10;

/// Options for the parse command
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Fail unless the whole sitemap validates
    pub validate: bool,
    /// Include field coverage statistics
    pub show_stats: bool,
}

/// Result of parsing a source
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParseOutcome {
    Sitemap {
        source: String,
        #[serde(flatten)]
        sitemap: Sitemap,
        #[serde(skip_serializing_if = "Option::is_none")]
        stats: Option<SitemapStats>,
        validated: bool,
    },
    Index {
        source: String,
        #[serde(flatten)]
        index: SitemapIndex,
    },
}

/// Read, detect and decode a sitemap or sitemap index
pub async fn cmd_parse(
    reader: &SourceReader,
    source: &str,
    options: ParseOptions,
) -> Result<ParseOutcome> {
    info!("Parsing sitemap from: {}", source);

    let data = reader.read(source).await?;
    let kind = sitemap::detect_type(&data)?;
    info!("Detected type: {}", kind);

    match kind {
        SitemapKind::Sitemap => {
            let parsed = sitemap::parse(&data)?;

            if options.validate {
                parsed.validate()?;
                info!("Sitemap is valid");
            }

            let stats = options.show_stats.then(|| parsed.stats());
            info!("Parsed sitemap with {} URLs", parsed.len());

            Ok(ParseOutcome::Sitemap {
                source: source.to_string(),
                sitemap: parsed,
                stats,
                validated: options.validate,
            })
        }
        SitemapKind::Index => {
            let index = sitemap::parse_index(&data)?;
            info!("Parsed sitemap index with {} sitemaps", index.sitemaps.len());

            Ok(ParseOutcome::Index {
                source: source.to_string(),
                index,
            })
        }
    }
}

/// Print a parse outcome to console
pub fn print_parse_outcome(outcome: &ParseOutcome) {
    match outcome {
        ParseOutcome::Sitemap {
            source,
            sitemap,
            stats,
            validated,
        } => {
            println!("✓ Parsed sitemap with {} URLs", sitemap.len());
            println!("  Source: {}", source);
            if *validated {
                println!("  Valid: yes");
            }

            if !sitemap.is_empty() {
                println!("\nSample URLs (first {}):", SAMPLE_SIZE.min(sitemap.len()));
                for url in sitemap.urls.iter().take(SAMPLE_SIZE) {
                    println!("  • {}", url.loc);
                    if let Some(lastmod) = url.lastmod.as_deref() {
                        println!("    Last Modified: {}", lastmod);
                    }
                    if let Some(changefreq) = url.changefreq.as_deref() {
                        println!("    Change Freq: {}", changefreq);
                    }
                    if let Some(priority) = url.priority {
                        println!("    Priority: {:.1}", priority);
                    }
                }
                if sitemap.len() > SAMPLE_SIZE {
                    println!("  ... and {} more", sitemap.len() - SAMPLE_SIZE);
                }
            }

            if let Some(stats) = stats {
                print_stats(stats);
            }
        }
        ParseOutcome::Index { source, index } => {
            println!(
                "✓ Parsed sitemap index with {} sitemaps",
                index.sitemaps.len()
            );
            println!("  Source: {}", source);

            if !index.sitemaps.is_empty() {
                println!("\nSitemaps:");
                for child in &index.sitemaps {
                    println!("  • {}", child.loc);
                    if let Some(lastmod) = child.lastmod.as_deref() {
                        println!("    Last Modified: {}", lastmod);
                    }
                }
            }
        }
    }
}

fn print_stats(stats: &SitemapStats) {
    println!("\nStatistics:");
    println!("  Total URLs: {}", stats.total_urls);
    println!("  With lastmod: {}", stats.with_lastmod);
    println!("  With priority: {}", stats.with_priority);
    println!("  With changefreq: {}", stats.with_changefreq);
}
