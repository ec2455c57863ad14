//! Bazaar Scan - Torn bazaar snapshot collector
//!
//! Scans registered sellers' bazaars into SQLite. Runs once by default, or
//! repeatedly on a fixed schedule with `scan --every-minutes N`.

use bazaar_scan::config::{DEFAULT_BASE_URL, DEFAULT_FLUSH_THRESHOLD};
use bazaar_scan::{database, open_database, ScanConfig, ScanRecord, Scanner};
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// Longest daemon period: one week
const MAX_EVERY_MINUTES: u64 = 7 * 24 * 60;

/// Torn bazaar scanner - snapshots seller bazaars into SQLite
#[derive(Parser, Debug)]
#[command(name = "bazaar_scan")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the SQLite database file
    #[arg(short, long, global = true, default_value_t = default_db_path())]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan the bazaars of all active sellers
    Scan(ScanArgs),
    /// Register seller IDs for scanning
    Add {
        /// Torn player IDs
        #[arg(required = true)]
        seller_ids: Vec<i64>,
    },
    /// Show seller counts and recent scans
    Status {
        /// Number of recent scans to show
        #[arg(long, default_value_t = 10)]
        scans: usize,

        /// Print as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Torn API key with access to bazaar data
    #[arg(long, env = "TORN_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Maximum number of sellers to scan (default: all)
    #[arg(long)]
    limit: Option<usize>,

    /// Pause between seller requests in milliseconds
    #[arg(long, default_value_t = 600)]
    delay_ms: u64,

    /// Write listings to the database every N listings
    #[arg(long, default_value_t = DEFAULT_FLUSH_THRESHOLD)]
    batch_size: usize,

    /// Torn API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Repeat the scan every N minutes until interrupted (default: run once)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_EVERY_MINUTES))]
    every_minutes: Option<u64>,
}

impl ScanArgs {
    fn to_config(&self) -> ScanConfig {
        ScanConfig::new(self.api_key.clone())
            .with_base_url(self.base_url.clone())
            .with_min_interval(Duration::from_millis(self.delay_ms))
            .with_flush_threshold(self.batch_size)
            .with_limit(self.limit)
    }
}

/// Returns the default database path: ~/.local/share/bazaar_scan/bazaar.db
fn default_db_path() -> String {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("bazaar_scan")
        .join("bazaar.db")
        .to_string_lossy()
        .to_string()
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let db_path = PathBuf::from(&cli.database);
    log::info!("Database path: {}", db_path.display());

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create database directory: {}", e);
                return ExitCode::FAILURE;
            }
            log::info!("Created directory: {}", parent.display());
        }
    }

    // Closed on every exit path when `conn` goes out of scope
    let mut conn = match open_database(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            log::error!("Failed to open database: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Scan(args) => run_scan(&mut conn, &args).await,
        Command::Add { seller_ids } => run_add(&mut conn, &seller_ids),
        Command::Status { scans, json } => run_status(&conn, scans, json),
    }
}

async fn run_scan(conn: &mut Connection, args: &ScanArgs) -> ExitCode {
    let mut scanner = match Scanner::new(args.to_config()) {
        Ok(scanner) => scanner,
        Err(e) => {
            log::error!("Failed to set up API client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match args.every_minutes {
        None => {
            if scan_once(conn, &mut scanner).await {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Some(minutes) => {
            log::info!("Running in daemon mode, scanning every {} minute(s)", minutes);
            run_daemon(conn, &mut scanner, Duration::from_secs(minutes * 60)).await;
            ExitCode::SUCCESS
        }
    }
}

/// Scan on a fixed schedule until Ctrl-C. A scan in progress always finishes.
async fn run_daemon(conn: &mut Connection, scanner: &mut Scanner, every: Duration) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                log::info!("Interrupted, stopping");
                break;
            }
        }
        scan_once(conn, scanner).await;
    }
}

async fn scan_once(conn: &mut Connection, scanner: &mut Scanner) -> bool {
    match scanner.run(conn).await {
        Ok(summary) => {
            log::info!(
                "Scan #{} {}: {} sellers, {} listings, {} deactivated, {} errors",
                summary.scan_id,
                summary.status,
                summary.sellers_attempted,
                summary.listings_found,
                summary.sellers_deactivated,
                summary.transient_errors
            );
            true
        }
        Err(e) => {
            log::error!("Scan failed: {}", e);
            false
        }
    }
}

fn run_add(conn: &mut Connection, seller_ids: &[i64]) -> ExitCode {
    match database::add_sellers(conn, seller_ids) {
        Ok(added) => {
            log::info!(
                "Added {} new sellers ({} already known)",
                added,
                seller_ids.len() - added
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Failed to add sellers: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusReport {
    active_sellers: i64,
    inactive_sellers: i64,
    listings: i64,
    catalog_items: i64,
    recent_scans: Vec<ScanRecord>,
}

fn load_status(conn: &Connection, scans: usize) -> database::DbResult<StatusReport> {
    let sellers = database::count_sellers(conn)?;
    Ok(StatusReport {
        active_sellers: sellers.active,
        inactive_sellers: sellers.inactive,
        listings: database::get_listing_count(conn)?,
        catalog_items: database::get_item_count(conn)?,
        recent_scans: database::recent_scans(conn, scans)?,
    })
}

fn run_status(conn: &Connection, scans: usize, json: bool) -> ExitCode {
    let report = match load_status(conn, scans) {
        Ok(report) => report,
        Err(e) => {
            log::error!("Failed to read status: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                log::error!("Failed to serialize status: {}", e);
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    println!(
        "Sellers: {} active, {} inactive",
        report.active_sellers, report.inactive_sellers
    );
    println!("Listings: {}", report.listings);
    println!("Catalog items: {}", report.catalog_items);
    println!();
    println!("Recent scans:");
    for scan in &report.recent_scans {
        let ended = scan
            .ended_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  #{:<5} {:<9} started {}  ended {}  sellers {:>5}  listings {:>6}",
            scan.id,
            scan.status,
            scan.started_at.format("%Y-%m-%d %H:%M:%S"),
            ended,
            scan.sellers_attempted,
            scan.listings_found
        );
    }
    ExitCode::SUCCESS
}
