//! `acq` command tree and command execution.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{info, warn};

use crate::book::Book;
use crate::budget::{calculate_budget_status, AlertLevel, BudgetSettings, BudgetStatus};
use crate::config::AppConfig;
use crate::service::{AcquisitionService, KeyStatus};
use crate::sources::{FetchSource, SearchTarget};
use crate::store::{JsonFileStore, StateStore};
use crate::workflow::{Transition, WorkflowBoard};

#[derive(Parser, Debug)]
#[command(
    name = "acq",
    version,
    about = "Book acquisition discovery, triage, and budget tracking"
)]
pub struct Cli {
    #[arg(long, global = true, help = "TOML config file (default: ./acq.toml when present)")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Directory holding settings.json and board.json")]
    pub state_dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a page of candidates into the discovery column.
    Fetch {
        #[arg(long, value_enum, default_value_t = SourceArg::Combined)]
        source: SourceArg,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Search the catalog and replace the discovery column with the hits.
    Search {
        query: String,
        #[arg(long, value_enum, default_value_t = TargetArg::Keyword)]
        target: TargetArg,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show all three columns.
    Board,
    /// Move a discovery candidate into review.
    Shortlist { id: String },
    /// Confirm a reviewed book for the order.
    Approve { id: String },
    /// Send a confirmed book back to review.
    Reopen { id: String },
    /// Drop a reviewed book.
    Discard { id: String },
    /// Report budget usage for the confirmed column.
    Budget {
        #[arg(long, default_value_t = false, help = "Write default settings if none are saved")]
        init: bool,
    },
    /// Verify the configured API keys.
    CheckKeys,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Combined,
    Bestseller,
    NewArrivals,
    Recommended,
}

impl From<SourceArg> for FetchSource {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::Combined => FetchSource::Combined,
            SourceArg::Bestseller => FetchSource::Bestseller,
            SourceArg::NewArrivals => FetchSource::NewArrivals,
            SourceArg::Recommended => FetchSource::Recommended,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TargetArg {
    Keyword,
    Title,
    Author,
    Publisher,
}

impl From<TargetArg> for SearchTarget {
    fn from(value: TargetArg) -> Self {
        match value {
            TargetArg::Keyword => SearchTarget::Keyword,
            TargetArg::Title => SearchTarget::Title,
            TargetArg::Author => SearchTarget::Author,
            TargetArg::Publisher => SearchTarget::Publisher,
        }
    }
}

/// Execute a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(state_dir) = &cli.state_dir {
        config = config.with_state_dir(state_dir.clone());
    }
    let store = JsonFileStore::new(&config.state_dir);
    let json = cli.json;

    match cli.command {
        Commands::Fetch { source, page } => {
            let service = AcquisitionService::from_config(&config);
            let books = service.fetch_books(source.into(), page).await?;
            refresh_discovery(&store, books, json)
        }
        Commands::Search {
            query,
            target,
            page,
        } => {
            let service = AcquisitionService::from_config(&config);
            let books = service.search_books(&query, target.into(), page).await?;
            if books.is_empty() {
                info!(query = %query, "search returned no results");
            }
            refresh_discovery(&store, books, json)
        }
        Commands::Board => {
            let board = load_board(&store)?;
            if json {
                print_json(&board)
            } else {
                print_board(&board);
                Ok(())
            }
        }
        Commands::Shortlist { id } => move_book(&store, Transition::Shortlist, &id, json),
        Commands::Approve { id } => move_book(&store, Transition::Approve, &id, json),
        Commands::Reopen { id } => move_book(&store, Transition::Reopen, &id, json),
        Commands::Discard { id } => move_book(&store, Transition::Discard, &id, json),
        Commands::Budget { init } => report_budget(&store, init, json),
        Commands::CheckKeys => {
            if config.catalog_key().is_none() && config.recommendation_key().is_none() {
                bail!("no API keys configured; set catalog_key or recommendation_key");
            }
            let service = AcquisitionService::from_config(&config);
            let status = service.check_keys().await;
            if json {
                print_json(&status)
            } else {
                print_key_status(&status, &config);
                Ok(())
            }
        }
    }
}

fn load_board(store: &JsonFileStore) -> Result<WorkflowBoard> {
    Ok(store
        .load_board()
        .context("loading board")?
        .unwrap_or_default())
}

fn refresh_discovery(store: &JsonFileStore, books: Vec<Book>, json: bool) -> Result<()> {
    let mut board = load_board(store)?;
    let fetched = books.len();
    let kept = board.replace_discovery(books);
    store.save_board(&board).context("saving board")?;
    info!(fetched, kept, "discovery column refreshed");

    if json {
        print_json(&board.discovery)
    } else {
        print_column("Discovery", &board.discovery);
        Ok(())
    }
}

fn move_book(store: &JsonFileStore, transition: Transition, id: &str, json: bool) -> Result<()> {
    let mut board = load_board(store)?;
    let book = board.apply(transition, id)?;
    store.save_board(&board).context("saving board")?;

    if json {
        return print_json(&book);
    }
    match transition.to_stage() {
        Some(stage) => println!("{} -> {}  {}", book.id.bold(), stage.as_label(), book.title),
        None => println!("{} discarded  {}", book.id.bold(), book.title),
    }
    Ok(())
}

fn report_budget(store: &JsonFileStore, init: bool, json: bool) -> Result<()> {
    let settings = match store.load_settings().context("loading settings")? {
        Some(settings) => settings,
        None => {
            let settings = BudgetSettings::default();
            if init {
                store.save_settings(&settings).context("saving settings")?;
                info!(path = %store.state_dir().display(), "default budget settings written");
            }
            settings
        }
    };
    if !settings.is_balanced() {
        warn!(
            total = settings.allocation_total(),
            "allocation percentages do not add up to 100"
        );
    }

    let board = load_board(store)?;
    let status = calculate_budget_status(&board.confirmed, &settings);

    if json {
        print_json(&status)
    } else {
        print_budget(&status);
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_board(board: &WorkflowBoard) {
    print_column("Discovery", &board.discovery);
    println!();
    print_column("Review", &board.review);
    println!();
    print_column("Confirmed", &board.confirmed);
}

fn print_column(title: &str, books: &[Book]) {
    println!("{} ({})", title.bold(), books.len());
    for book in books {
        println!(
            "  {:<14} {} / {} ({}, {})  {}",
            book.id,
            book.title,
            book.author,
            book.publisher,
            book.pub_date,
            book.price_sales
        );
        if let Some(category) = &book.category_name {
            println!("  {:<14} {}", "", category.dimmed());
        }
    }
}

fn colored_level(level: AlertLevel) -> String {
    match level {
        AlertLevel::Safe => level.as_label().green().to_string(),
        AlertLevel::Warning => level.as_label().yellow().to_string(),
        AlertLevel::Danger => level.as_label().red().bold().to_string(),
    }
}

fn print_budget(status: &BudgetStatus) {
    print!("{}", status.format());
    let alerts: Vec<_> = status.alerts().collect();
    if !alerts.is_empty() {
        println!();
        for alert in alerts {
            println!(
                "{} {} at {:.1}% ({} of {})",
                colored_level(alert.alert_level),
                alert.name,
                alert.usage_percentage,
                alert.used_amount,
                alert.allocated_amount
            );
        }
    }
}

fn print_key_status(status: &KeyStatus, config: &AppConfig) {
    let describe = |configured: bool, valid: bool| -> String {
        if !configured {
            "not configured".dimmed().to_string()
        } else if valid {
            "valid".green().to_string()
        } else {
            "rejected".red().to_string()
        }
    };
    println!(
        "catalog:        {}",
        describe(config.catalog_key().is_some(), status.catalog)
    );
    println!(
        "recommendation: {}",
        describe(config.recommendation_key().is_some(), status.recommendation)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fetch_defaults() {
        let cli = Cli::try_parse_from(["acq", "fetch"]).unwrap();
        match cli.command {
            Commands::Fetch { source, page } => {
                assert_eq!(source, SourceArg::Combined);
                assert_eq!(page, 1);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(!cli.json);
    }

    #[test]
    fn test_parse_source_and_globals() {
        let cli = Cli::try_parse_from([
            "acq",
            "fetch",
            "--source",
            "new-arrivals",
            "--page",
            "3",
            "--json",
            "--state-dir",
            "/tmp/acq",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/acq")));
        assert!(matches!(
            cli.command,
            Commands::Fetch {
                source: SourceArg::NewArrivals,
                page: 3
            }
        ));
        assert_eq!(FetchSource::from(SourceArg::NewArrivals), FetchSource::NewArrivals);
    }

    #[test]
    fn test_parse_search_target() {
        let cli = Cli::try_parse_from(["acq", "search", "한강", "--target", "author"]).unwrap();
        match cli.command {
            Commands::Search { query, target, .. } => {
                assert_eq!(query, "한강");
                assert_eq!(SearchTarget::from(target), SearchTarget::Author);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_source() {
        assert!(Cli::try_parse_from(["acq", "fetch", "--source", "everything"]).is_err());
        assert!(Cli::try_parse_from(["acq", "approve"]).is_err());
    }
}
