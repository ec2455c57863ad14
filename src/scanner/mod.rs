//! Scan orchestration
//!
//! One scan: open a `running` history record, refresh the item catalog,
//! walk the active sellers least-recently-checked first (one request at a
//! time, paced by the rate governor), write listings in batches, and close
//! the record as `completed` or `failed`.
//!
//! Per-seller problems (unknown ID, network trouble, API errors) never stop a
//! scan. Anything else does, and whatever was flushed before stays flushed.

mod catalog;
mod fetcher;
mod governor;
mod writer;

pub use catalog::{CatalogCache, ItemCatalog};
pub use fetcher::{classify, SellerFetchOutcome, SellerFetcher};
pub use governor::RateGovernor;
pub use writer::{SnapshotBatch, SnapshotWriter};

use crate::config::ScanConfig;
use crate::database::{self, DbResult};
use crate::error::{Result, ScanError};
use crate::models::{ScanStatus, Seller};
use crate::torn::TornClient;
use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;

/// Outcome of a finished scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub scan_id: i64,
    pub status: ScanStatus,
    pub sellers_attempted: i64,
    pub listings_found: i64,
    pub sellers_deactivated: i64,
    pub transient_errors: i64,
    /// Number of snapshot batches written
    pub flushes: usize,
    /// Listings inserted by each batch, in flush order
    pub batch_sizes: Vec<usize>,
}

#[derive(Debug, Default)]
struct ScanProgress {
    sellers_attempted: i64,
    listings_found: i64,
    sellers_deactivated: i64,
    transient_errors: i64,
}

/// Drives complete scans against one Torn API key
#[derive(Debug)]
pub struct Scanner {
    config: ScanConfig,
    client: TornClient,
    fetcher: SellerFetcher,
    catalog: CatalogCache,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Result<Self> {
        let client = TornClient::new(&config)?;
        Ok(Self {
            fetcher: SellerFetcher::new(client.clone()),
            client,
            catalog: CatalogCache::new(),
            config,
        })
    }

    /// Run one scan to completion.
    ///
    /// The scan record is always closed before returning. On failure it is
    /// marked `failed` with the counts reached so far and the error is
    /// returned to the caller.
    pub async fn run(&mut self, conn: &mut Connection) -> Result<ScanSummary> {
        report_stale_scans(conn);

        let scan_id = database::start_scan(conn, Utc::now())?;
        log::info!("Started scan #{}", scan_id);

        let mut progress = ScanProgress::default();
        let mut writer = SnapshotWriter::new();
        let result = self.execute(conn, &mut progress, &mut writer).await;

        let status = match result {
            Ok(()) => ScanStatus::Completed,
            Err(_) => ScanStatus::Failed,
        };
        let finalized = database::finish_scan(
            conn,
            scan_id,
            status,
            Utc::now(),
            progress.sellers_attempted,
            progress.listings_found,
        );

        match result {
            Ok(()) => {
                finalized?;
                log::info!(
                    "Completed scan #{}: {} sellers scanned, {} listings found",
                    scan_id,
                    progress.sellers_attempted,
                    progress.listings_found
                );
                Ok(ScanSummary {
                    scan_id,
                    status,
                    sellers_attempted: progress.sellers_attempted,
                    listings_found: progress.listings_found,
                    sellers_deactivated: progress.sellers_deactivated,
                    transient_errors: progress.transient_errors,
                    flushes: writer.flushes(),
                    batch_sizes: writer.batch_sizes().to_vec(),
                })
            }
            Err(e) => {
                log::error!("Scan #{} failed: {}", scan_id, e);
                if let Err(db_err) = finalized {
                    log::error!("Could not mark scan #{} as failed: {}", scan_id, db_err);
                }
                Err(e)
            }
        }
    }

    async fn execute(
        &mut self,
        conn: &mut Connection,
        progress: &mut ScanProgress,
        writer: &mut SnapshotWriter,
    ) -> Result<()> {
        let catalog = self
            .catalog
            .refresh(&self.client, conn)
            .await
            .map_err(|e| ScanError::CatalogRefresh(Box::new(e)))?;

        let sellers = load_scan_candidates(conn, self.config.limit)?;
        if sellers.is_empty() {
            log::info!("No active sellers found in the database");
            return Ok(());
        }

        let total = sellers.len();
        log::info!("Starting scan of {} sellers", total);

        let mut governor = RateGovernor::new(self.config.min_interval);
        let mut batch = SnapshotBatch::new();

        for (index, seller) in sellers.iter().enumerate() {
            if index > 0 {
                governor.wait().await;
            }
            log::info!(
                "Scanning seller {} ({}/{})",
                seller.seller_id,
                index + 1,
                total
            );

            let outcome = self.fetcher.fetch(conn, seller.seller_id, &catalog).await?;
            governor.record();
            progress.sellers_attempted += 1;

            match outcome {
                SellerFetchOutcome::Listings(listings) => {
                    log::info!(
                        "Found {} items in seller {}'s bazaar",
                        listings.len(),
                        seller.seller_id
                    );
                    progress.listings_found += listings.len() as i64;
                    batch.push(seller.seller_id, listings);
                }
                SellerFetchOutcome::NotFound => {
                    database::deactivate_seller(conn, seller.seller_id)?;
                    progress.sellers_deactivated += 1;
                    log::warn!(
                        "Seller {} not found - marked as inactive",
                        seller.seller_id
                    );
                }
                SellerFetchOutcome::TransientError(detail) => {
                    progress.transient_errors += 1;
                    log::warn!(
                        "Failed to fetch bazaar for seller {}: {}",
                        seller.seller_id,
                        detail
                    );
                }
            }

            if batch.is_full(self.config.flush_threshold) {
                writer.flush(conn, batch.take())?;
            }
        }

        writer.flush(conn, batch.take())?;
        Ok(())
    }
}

/// Active sellers in scan order, capped at `limit` (0 means no cap)
pub fn load_scan_candidates(conn: &Connection, limit: Option<usize>) -> DbResult<Vec<Seller>> {
    let mut sellers = database::load_active_sellers(conn)?;
    sellers.sort_by(Seller::check_order);
    if let Some(limit) = limit.filter(|&n| n > 0) {
        sellers.truncate(limit);
    }
    Ok(sellers)
}

/// Warn about scans that never reached a final state (e.g. the process died)
fn report_stale_scans(conn: &Connection) {
    match database::running_scans(conn) {
        Ok(stale) => {
            for scan in stale {
                log::warn!(
                    "Scan #{} started at {} is still marked running",
                    scan.id,
                    scan.started_at
                );
            }
        }
        Err(e) => log::warn!("Could not check for unfinished scans: {}", e),
    }
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
