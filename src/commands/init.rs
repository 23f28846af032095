//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::meta::open_store;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub config_path: PathBuf,
    /// Overwrite an existing config file
    pub force: bool,
}

/// Paths written by `init`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitSummary {
    pub config_path: String,
    pub db_path: String,
    pub storage_backend: String,
}

/// Write the default configuration and create the report database
pub async fn cmd_init(options: InitOptions) -> Result<InitSummary> {
    let InitOptions { config_path, force } = options;

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    let base_dir = config_path.parent().map(PathBuf::from);
    let mut config = Config::with_base_dir(base_dir);
    config.paths.config_file = config_path;
    config.validate()?;

    config.save()?;
    info!("Created config at {:?}", config.paths.config_file);

    let store = open_store(&config).await?;
    info!("Report store ready ({})", store.backend());

    Ok(InitSummary {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        storage_backend: config.storage.backend.clone(),
    })
}

/// Print init results to console
pub fn print_init_summary(summary: &InitSummary) {
    println!("✓ sitemapper initialized successfully");
    println!("  Config: {}", summary.config_path);
    println!("  Database: {}", summary.db_path);
    println!("\nNext steps:");
    println!("  sitemapper parse https://example.com/sitemap.xml --validate");
    println!("  sitemapper track https://example.com/sitemap.xml --name v1");
    println!("  sitemapper report list");
}
