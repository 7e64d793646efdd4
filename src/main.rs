//! game-catalog - builds a cross-store game catalog
//!
//! Collects listings from Steam and Metacritic and merges them with an Epic
//! Games Store table by fuzzy name matching.

use anyhow::Result;
use clap::{Parser, Subcommand};
use game_catalog::catalog::Source;
use game_catalog::collect::{Cancellation, ValidationPolicy};
use game_catalog::commands::{CollectCommand, MergeCommand, MergeInputs};
use game_catalog::config::{Config, OutputFormat};
use game_catalog::format::Formatter;
use std::path::PathBuf;
use tracing::{warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "game-catalog",
    version,
    about = "Collects game listings and reconciles them into one catalog",
    long_about = "Collects paginated game listings from Steam and Metacritic, then merges them \
                  with an Epic Games Store table into one row per Steam game."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format for stdout
    #[arg(short, long, global = true)]
    format: Option<OutputFormat>,

    /// Proxy URL (e.g., socks5://host:port)
    #[arg(long, global = true, env = "GAMECAT_PROXY")]
    proxy: Option<String>,

    /// Delay between page fetches in milliseconds
    #[arg(long, global = true)]
    delay: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Collect listings from one source into a CSV table
    #[command(alias = "c")]
    Collect {
        /// Source to collect (steam, metacritic)
        source: Source,

        /// Output CSV path [default: <source>_games.csv]
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Stop after this many items (0 = no limit)
        #[arg(short, long)]
        target: Option<usize>,

        /// Listings requested per page
        #[arg(long)]
        page_size: Option<u32>,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<u32>,

        /// Search term (Steam only)
        #[arg(long)]
        term: Option<String>,

        /// Excluded title keywords (comma-separated)
        #[arg(long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Remove "<word> Edition" fragments from titles
        #[arg(long)]
        strip_edition: bool,

        /// Keep or drop items whose validation fails (accept, reject)
        #[arg(long)]
        on_validation_error: Option<ValidationPolicy>,

        /// Keep or drop items whose validation times out (accept, reject)
        #[arg(long)]
        on_validation_timeout: Option<ValidationPolicy>,
    },

    /// Merge Steam, Metacritic and Epic tables into one catalog
    #[command(alias = "m")]
    Merge {
        /// Steam table (name, price, url)
        #[arg(long)]
        steam: PathBuf,

        /// Metacritic table (name, score, url)
        #[arg(long)]
        metacritic: PathBuf,

        /// Epic Games Store table (name, price, url)
        #[arg(long)]
        epic: PathBuf,

        /// Merged CSV path
        #[arg(short, long, default_value = "merged_games.csv")]
        output: PathBuf,

        /// Fuzzy match threshold (0-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        threshold: Option<u8>,

        /// Drop games without any storefront price
        #[arg(long)]
        priced_only: bool,
    },

    /// List known sources
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    if let Some(format) = cli.format {
        config.format = format;
    }
    if let Some(delay) = cli.delay {
        config.delay_ms = delay;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy = Some(proxy);
    }

    match cli.command {
        Commands::Collect {
            source,
            output,
            target,
            page_size,
            max_pages,
            term,
            exclude,
            strip_edition,
            on_validation_error,
            on_validation_timeout,
        } => {
            if let Some(t) = target {
                config.target_items = t;
            }
            if let Some(size) = page_size {
                config.page_size = size;
            }
            if max_pages.is_some() {
                config.max_pages = max_pages;
            }
            if let Some(ex) = exclude {
                config.exclude_keywords = ex;
            }
            if let Some(policy) = on_validation_error {
                config.on_validation_error = policy;
            }
            if let Some(policy) = on_validation_timeout {
                config.on_validation_timeout = policy;
            }
            config.strip_edition |= strip_edition;

            let cancel = Cancellation::new();
            let handle = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, stopping after the current page");
                    handle.cancel();
                }
            });

            let formatter = Formatter::new(config.format);
            let cmd = CollectCommand::new(config, source).with_output(output).with_term(term);
            let report = cmd.execute(&cancel).await?;
            println!("{}", formatter.format_report(&report));

            if !report.is_success() {
                anyhow::bail!("Collection failed: {}", report.termination);
            }
        }

        Commands::Merge { steam, metacritic, epic, output, threshold, priced_only } => {
            if let Some(t) = threshold {
                config.threshold = t;
            }

            let cmd = MergeCommand::new(config, MergeInputs { steam, metacritic, epic })
                .with_output(Some(output))
                .priced_only(priced_only);
            println!("{}", cmd.execute()?);
        }

        Commands::Sources => {
            println!("Known sources:\n");
            println!("{:<12} {:<22} {:<8}", "Source", "Role", "Column");
            println!("{:-<12} {:-<22} {:-<8}", "", "", "");

            for source in Source::all() {
                println!(
                    "{:<12} {:<22} {:<8}",
                    source.to_string(),
                    source.role(),
                    source.value_column()
                );
            }
        }
    }

    Ok(())
}
