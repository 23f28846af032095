//! sitemapper CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use sitemapper::{
    commands::{
        cmd_compare, cmd_delete_report, cmd_get_report, cmd_init, cmd_list_reports, cmd_parse,
        cmd_track, print_compare_report, print_init_summary, print_parse_outcome,
        print_report_completions, print_report_details, print_reports, print_track_summary,
        InitOptions, ParseOptions, TrackArgs,
    },
    config::Config,
    error::Result,
    fetch::SourceReader,
    meta::open_store,
};
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "sitemapper")]
#[command(version, about = "Parse, validate, track and compare XML sitemaps", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "SITEMAPPER_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration and create the report database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Parse a sitemap or sitemap index from a file or URL
    Parse {
        /// File path or http(s) URL
        source: String,

        /// Fail unless every URL passes protocol validation
        #[arg(long)]
        validate: bool,

        /// Show field coverage statistics
        #[arg(long)]
        show_stats: bool,
    },

    /// Save a snapshot of a sitemap for later comparison
    Track {
        /// File path or http(s) URL
        source: String,

        /// Name for this snapshot
        #[arg(long)]
        name: Option<String>,

        /// Owner of the snapshot (defaults to config default_user_id)
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Compare two sitemaps and show differences
    ///
    /// Each source may be a report ID, a file path or a URL
    Compare {
        source1: String,
        source2: String,

        /// Show unchanged URLs in output
        #[arg(long)]
        show_unchanged: bool,
    },

    /// Manage saved snapshots
    Report {
        #[command(subcommand)]
        action: ReportAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ReportAction {
    /// List saved snapshots, newest first
    List {
        /// Only show reports owned by this user (defaults to config default_user_id)
        #[arg(long)]
        user_id: Option<String>,

        /// Maximum number of reports
        #[arg(short, long, default_value = "50")]
        limit: i64,

        /// Output only report IDs (one per line, for scripting)
        #[arg(long)]
        ids_only: bool,

        /// Output report IDs with descriptions for shell completions
        #[arg(long, value_enum, hide = true)]
        completion: Option<Shell>,
    },

    /// Show a report and its first entries
    Get {
        /// Report ID (use 'sitemapper report list' to list)
        report_id: String,
    },

    /// Delete a report and its entries
    Delete {
        /// Report ID to delete
        report_id: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{} error: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config_path = resolve_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Init { force } => {
            let summary = cmd_init(InitOptions { config_path, force }).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_init_summary(&summary);
            }
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "sitemapper", &mut std::io::stdout());
        }

        Commands::Parse {
            source,
            validate,
            show_stats,
        } => {
            let config = Config::load(&config_path)?;
            let reader = SourceReader::new(&config.fetch)?;

            let options = ParseOptions {
                validate,
                show_stats,
            };
            let outcome = cmd_parse(&reader, &source, options).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_parse_outcome(&outcome);
            }
        }

        Commands::Track {
            source,
            name,
            user_id,
        } => {
            let config = Config::load(&config_path)?;
            let reader = SourceReader::new(&config.fetch)?;
            let store = open_store(&config).await?;

            let args = TrackArgs {
                source,
                name,
                user_id,
            };
            let summary = cmd_track(&config, store.as_ref(), &reader, args).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_track_summary(&summary);
            }
        }

        Commands::Compare {
            source1,
            source2,
            show_unchanged,
        } => {
            let config = Config::load(&config_path)?;
            let reader = SourceReader::new(&config.fetch)?;
            let store = open_store(&config).await?;

            let report =
                cmd_compare(store.as_ref(), &reader, &source1, &source2, show_unchanged).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_compare_report(&report);
            }
        }

        Commands::Report { action } => {
            let config = Config::load(&config_path)?;
            handle_report_action(&config, action, cli.json).await?;
        }
    }

    Ok(())
}

async fn handle_report_action(config: &Config, action: ReportAction, json: bool) -> Result<()> {
    let store = open_store(config).await?;

    match action {
        ReportAction::List {
            user_id,
            limit,
            ids_only,
            completion,
        } => {
            let reports = cmd_list_reports(config, store.as_ref(), user_id, limit).await?;

            if let Some(shell) = completion {
                print_report_completions(&reports, shell);
            } else if ids_only {
                for report in &reports {
                    println!("{}", report.id);
                }
            } else if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                print_reports(&reports);
            }
        }

        ReportAction::Get { report_id } => {
            let details = cmd_get_report(store.as_ref(), &report_id).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&details)?);
            } else {
                print_report_details(&details);
            }
        }

        ReportAction::Delete { report_id } => {
            cmd_delete_report(store.as_ref(), &report_id).await?;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "report_id": report_id,
                        "deleted": true,
                    }))?
                );
            } else {
                println!("✓ Report '{}' deleted", report_id);
            }
        }
    }

    Ok(())
}

/// A `.toml` path is used as-is; any other path is treated as a directory
fn resolve_config_path(path: Option<&Path>) -> PathBuf {
    match path {
        Some(path) if path.extension().is_some_and(|e| e == "toml") => path.to_path_buf(),
        Some(dir) => dir.join("config.toml"),
        None => Config::default_config_path(),
    }
}
