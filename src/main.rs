//! ptt-crawler main entry point
//!
//! This is the command-line interface for the PTT board crawler.

use anyhow::Context;
use clap::{ArgGroup, Parser};
use ptt_crawler::boards::BoardList;
use ptt_crawler::config::{load_config_with_hash, validate, Config};
use ptt_crawler::output::print_report;
use ptt_crawler::{BoardCrawler, JsonlSink};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// ptt-crawler: a polite PTT board archiver
///
/// Crawls every listing page of a board and writes one JSON record per
/// thread to `{output}/{board}.jsonl`, backing off whenever the forum
/// reports that it is busy.
#[derive(Parser, Debug)]
#[command(name = "ptt-crawler")]
#[command(version)]
#[command(about = "A polite PTT board archiver", long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["board", "file", "list"])))]
struct Cli {
    /// Path to TOML configuration file; built-in defaults when omitted
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Crawl a single board
    #[arg(short, long, value_name = "NAME")]
    board: Option<String>,

    /// Crawl every board in the board list, removing each one once done
    #[arg(short, long)]
    file: bool,

    /// Print the boards in the board list and exit
    #[arg(short, long)]
    list: bool,

    /// Board list to use instead of the configured one
    #[arg(long, value_name = "PATH")]
    boards_file: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "list")]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;
    let boards_file = cli
        .boards_file
        .clone()
        .unwrap_or_else(|| config.output.boards_file.clone());

    if cli.list {
        return handle_list(&boards_file);
    }

    let boards = match &cli.board {
        Some(board) => vec![board.clone()],
        None => BoardList::load(&boards_file)?.boards().to_vec(),
    };

    if cli.dry_run {
        handle_dry_run(&config, &boards);
        return Ok(());
    }

    std::fs::create_dir_all(&config.output.directory).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output.directory.display()
        )
    })?;

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    let sink = JsonlSink::new(&config.output.directory)?;
    let mut crawler = BoardCrawler::new(&config, sink, cancel)?;

    match &cli.board {
        Some(board) => {
            let report = crawler.crawl_board(board).await?;
            print_report(&report);
        }
        None => {
            let mut list = BoardList::load(&boards_file)?;
            for report in crawler.crawl_board_list(&mut list).await? {
                print_report(&report);
                println!();
            }
            if list.is_empty() {
                tracing::info!("All boards in {} are done", boards_file.display());
            }
        }
    }

    Ok(())
}

/// Loads and validates the configuration, or falls back to the defaults
fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            let config = Config::default();
            validate(&config)?;
            tracing::debug!("Using built-in configuration");
            Ok(config)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ptt_crawler=info,warn"),
            1 => EnvFilter::new("ptt_crawler=debug,info"),
            2 => EnvFilter::new("ptt_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Cancels the crawl on Ctrl+C; in-flight requests and delays stop promptly
fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received Ctrl+C, stopping after the current request...");
                cancel.cancel();
            }
            Err(e) => tracing::warn!("Failed to install Ctrl+C handler: {}", e),
        }
    });
}

/// Handles --list: prints the pending boards
fn handle_list(path: &Path) -> anyhow::Result<()> {
    let list = BoardList::load(path)?;
    println!("Boards in {} ({}):", path.display(), list.boards().len());
    for board in list.boards() {
        println!("  - {}", board);
    }
    Ok(())
}

/// Handles --dry-run: shows the configuration and the board queue
fn handle_dry_run(config: &Config, boards: &[String]) {
    println!("=== ptt-crawler Dry Run ===\n");

    println!("Site:");
    println!("  Base URL: {}", config.site.base_url);
    println!("  Busy marker: {}", config.site.busy_marker);

    println!("\nCrawler Configuration:");
    println!("  Page delay: {}ms", config.crawler.page_delay);
    println!("  Article delay: {}ms", config.crawler.article_delay);
    println!(
        "  Busy backoff: {}ms up to {}ms, {} retries",
        config.crawler.busy_delay, config.crawler.max_busy_delay, config.crawler.max_busy_retries
    );
    println!(
        "  Concurrent articles: {}",
        config.crawler.max_concurrent_articles
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());

    println!("\nBoards ({}):", boards.len());
    for board in boards {
        println!("  - {}", board);
    }

    println!("\n✓ Configuration is valid");
}
