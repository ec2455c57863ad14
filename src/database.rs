//! Database operations for the bazaar scanner
//!
//! Uses parameterized queries exclusively (no SQL string concatenation).
//! Multi-row writes are transactional so a batch lands completely or not at all.

use crate::models::{CatalogItem, Listing, ScanRecord, ScanStatus, Seller};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql, Transaction};
use std::collections::BTreeSet;
use std::path::Path;

/// Result type for database operations
pub type DbResult<T> = rusqlite::Result<T>;

impl ToSql for ScanStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ScanStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        ScanStatus::parse(text)
            .ok_or_else(|| FromSqlError::Other(format!("unknown scan status '{}'", text).into()))
    }
}

/// Open (or create) the database file and make sure the schema exists.
///
/// The returned connection is closed when dropped.
pub fn open_database(path: &Path) -> DbResult<Connection> {
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Initialize the database schema
///
/// Creates tables if they don't exist:
/// - `sellers`: bazaar owners to poll, with last check time and active flag
/// - `items`: item catalog, overwritten on every refresh
/// - `listings`: current bazaar snapshot, owned per seller
/// - `scan_history`: one row per scan run
pub fn init_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS sellers (
            seller_id INTEGER PRIMARY KEY,
            last_checked TEXT,
            active INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS items (
            item_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            subtype TEXT NOT NULL DEFAULT '',
            market_value INTEGER NOT NULL DEFAULT 0,
            last_updated TEXT NOT NULL
        );

        -- item_id and seller_id are plain references; an item may be missing
        -- from the catalog, so no foreign keys are declared
        CREATE TABLE IF NOT EXISTS listings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id INTEGER,
            item_name TEXT NOT NULL,
            category TEXT NOT NULL,
            price INTEGER NOT NULL,
            quantity INTEGER NOT NULL,
            seller_id INTEGER NOT NULL,
            seller_name TEXT NOT NULL,
            market_value INTEGER NOT NULL DEFAULT 0,
            captured_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_listings_category ON listings(category);
        CREATE INDEX IF NOT EXISTS idx_listings_seller ON listings(seller_id);
        CREATE INDEX IF NOT EXISTS idx_listings_item ON listings(item_id);

        CREATE TABLE IF NOT EXISTS scan_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            start_time TEXT NOT NULL,
            end_time TEXT,
            sellers_attempted INTEGER NOT NULL DEFAULT 0,
            listings_found INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'running'
        );
        ",
    )?;

    log::debug!("Database schema initialized");
    Ok(())
}

// ── Sellers ────────────────────────────────────────────────────────────────

/// Register sellers as active and never checked.
///
/// Existing sellers are left alone (a deactivated seller stays deactivated).
/// Returns the number of newly added sellers.
pub fn add_sellers(conn: &mut Connection, seller_ids: &[i64]) -> DbResult<usize> {
    let tx = conn.transaction()?;
    let added = {
        let mut stmt = tx.prepare_cached(
            "INSERT OR IGNORE INTO sellers (seller_id, last_checked, active) VALUES (?1, NULL, 1)",
        )?;
        let mut added = 0;
        for seller_id in seller_ids {
            added += stmt.execute(params![seller_id])?;
        }
        added
    };
    tx.commit()?;
    Ok(added)
}

fn seller_from_row(row: &Row<'_>) -> DbResult<Seller> {
    Ok(Seller {
        seller_id: row.get(0)?,
        last_checked: row.get(1)?,
        active: row.get(2)?,
    })
}

/// All sellers with `active = 1`, in no particular order
pub fn load_active_sellers(conn: &Connection) -> DbResult<Vec<Seller>> {
    let mut stmt =
        conn.prepare("SELECT seller_id, last_checked, active FROM sellers WHERE active = 1")?;
    let sellers = stmt
        .query_map([], seller_from_row)?
        .collect::<DbResult<Vec<_>>>()?;
    Ok(sellers)
}

/// Look up a single seller
pub fn get_seller(conn: &Connection, seller_id: i64) -> DbResult<Option<Seller>> {
    conn.query_row(
        "SELECT seller_id, last_checked, active FROM sellers WHERE seller_id = ?1",
        params![seller_id],
        seller_from_row,
    )
    .optional()
}

/// Record a fetch attempt for a seller
pub fn touch_seller(conn: &Connection, seller_id: i64, checked_at: DateTime<Utc>) -> DbResult<()> {
    conn.execute(
        "UPDATE sellers SET last_checked = ?1 WHERE seller_id = ?2",
        params![checked_at, seller_id],
    )?;
    Ok(())
}

/// Exclude a seller from future scans
pub fn deactivate_seller(conn: &Connection, seller_id: i64) -> DbResult<()> {
    conn.execute(
        "UPDATE sellers SET active = 0 WHERE seller_id = ?1",
        params![seller_id],
    )?;
    Ok(())
}

/// Seller totals for status reporting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SellerCounts {
    pub active: i64,
    pub inactive: i64,
}

pub fn count_sellers(conn: &Connection) -> DbResult<SellerCounts> {
    conn.query_row(
        "SELECT COALESCE(SUM(active = 1), 0), COALESCE(SUM(active = 0), 0) FROM sellers",
        [],
        |row| {
            Ok(SellerCounts {
                active: row.get(0)?,
                inactive: row.get(1)?,
            })
        },
    )
}

// ── Item catalog ───────────────────────────────────────────────────────────

/// Upsert catalog items, overwriting every column by item ID.
///
/// All operations are wrapped in a transaction for atomicity.
pub fn upsert_items(conn: &mut Connection, items: &[CatalogItem]) -> DbResult<usize> {
    let tx = conn.transaction()?;
    let count = upsert_items_tx(&tx, items)?;
    tx.commit()?;
    Ok(count)
}

fn upsert_items_tx(tx: &Transaction<'_>, items: &[CatalogItem]) -> DbResult<usize> {
    let mut stmt = tx.prepare_cached(
        "INSERT OR REPLACE INTO items
         (item_id, name, category, subtype, market_value, last_updated)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    for item in items {
        stmt.execute(params![
            item.item_id,
            &item.name,
            &item.category,
            &item.subtype,
            item.market_value,
            item.refreshed_at,
        ])?;
    }

    log::debug!("Upserted {} catalog items", items.len());
    Ok(items.len())
}

/// Look up a catalog item by ID
pub fn get_catalog_item(conn: &Connection, item_id: i64) -> DbResult<Option<CatalogItem>> {
    conn.query_row(
        "SELECT item_id, name, category, subtype, market_value, last_updated
         FROM items WHERE item_id = ?1",
        params![item_id],
        |row| {
            Ok(CatalogItem {
                item_id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                subtype: row.get(3)?,
                market_value: row.get(4)?,
                refreshed_at: row.get(5)?,
            })
        },
    )
    .optional()
}

pub fn get_item_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))
}

// ── Listings ───────────────────────────────────────────────────────────────

/// Replace the listings of every seller in the batch.
///
/// Deletes all existing rows for `seller_ids` (plus any seller that appears in
/// `listings`), then inserts `listings`, in one transaction. Readers see
/// either the old or the new snapshot for each seller, never a mix.
/// Returns the number of inserted rows.
pub fn replace_listings(
    conn: &mut Connection,
    seller_ids: &[i64],
    listings: &[Listing],
) -> DbResult<usize> {
    let tx = conn.transaction()?;
    let inserted = replace_listings_tx(&tx, seller_ids, listings)?;
    tx.commit()?;
    Ok(inserted)
}

fn replace_listings_tx(
    tx: &Transaction<'_>,
    seller_ids: &[i64],
    listings: &[Listing],
) -> DbResult<usize> {
    let sellers: BTreeSet<i64> = seller_ids
        .iter()
        .copied()
        .chain(listings.iter().map(|l| l.seller_id))
        .collect();

    let mut delete = tx.prepare_cached("DELETE FROM listings WHERE seller_id = ?1")?;
    let mut removed = 0;
    for seller_id in &sellers {
        removed += delete.execute(params![seller_id])?;
    }

    let mut insert = tx.prepare_cached(
        "INSERT INTO listings
         (item_id, item_name, category, price, quantity, seller_id, seller_name, market_value, captured_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    for listing in listings {
        insert.execute(params![
            listing.item_id,
            &listing.item_name,
            &listing.category,
            listing.price,
            listing.quantity,
            listing.seller_id,
            &listing.seller_name,
            listing.market_value,
            listing.captured_at,
        ])?;
    }

    log::debug!(
        "Replaced listings for {} sellers ({} removed, {} inserted)",
        sellers.len(),
        removed,
        listings.len()
    );
    Ok(listings.len())
}

/// Current listings of one seller, ordered by item ID
pub fn listings_for_seller(conn: &Connection, seller_id: i64) -> DbResult<Vec<Listing>> {
    let mut stmt = conn.prepare(
        "SELECT id, item_id, item_name, category, market_value, price, quantity,
                seller_id, seller_name, captured_at
         FROM listings
         WHERE seller_id = ?1
         ORDER BY item_id, id",
    )?;

    let listings = stmt
        .query_map(params![seller_id], |row| {
            Ok(Listing {
                id: row.get(0)?,
                item_id: row.get(1)?,
                item_name: row.get(2)?,
                category: row.get(3)?,
                market_value: row.get(4)?,
                price: row.get(5)?,
                quantity: row.get(6)?,
                seller_id: row.get(7)?,
                seller_name: row.get(8)?,
                captured_at: row.get(9)?,
            })
        })?
        .collect::<DbResult<Vec<_>>>()?;
    Ok(listings)
}

pub fn get_listing_count(conn: &Connection) -> DbResult<i64> {
    conn.query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))
}

// ── Scan history ───────────────────────────────────────────────────────────

/// Open a new scan record in `running` state and return its ID
pub fn start_scan(conn: &Connection, started_at: DateTime<Utc>) -> DbResult<i64> {
    conn.execute(
        "INSERT INTO scan_history (start_time, status) VALUES (?1, ?2)",
        params![started_at, ScanStatus::Running],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Close a scan record with its final status and totals
pub fn finish_scan(
    conn: &Connection,
    scan_id: i64,
    status: ScanStatus,
    ended_at: DateTime<Utc>,
    sellers_attempted: i64,
    listings_found: i64,
) -> DbResult<()> {
    conn.execute(
        "UPDATE scan_history
         SET end_time = ?1, sellers_attempted = ?2, listings_found = ?3, status = ?4
         WHERE id = ?5",
        params![ended_at, sellers_attempted, listings_found, status, scan_id],
    )?;
    Ok(())
}

const SCAN_COLUMNS: &str =
    "id, start_time, end_time, sellers_attempted, listings_found, status";

fn scan_from_row(row: &Row<'_>) -> DbResult<ScanRecord> {
    Ok(ScanRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        ended_at: row.get(2)?,
        sellers_attempted: row.get(3)?,
        listings_found: row.get(4)?,
        status: row.get(5)?,
    })
}

pub fn get_scan(conn: &Connection, scan_id: i64) -> DbResult<Option<ScanRecord>> {
    conn.query_row(
        &format!("SELECT {} FROM scan_history WHERE id = ?1", SCAN_COLUMNS),
        params![scan_id],
        scan_from_row,
    )
    .optional()
}

/// Scan records still marked `running`, oldest first
pub fn running_scans(conn: &Connection) -> DbResult<Vec<ScanRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM scan_history WHERE status = ?1 ORDER BY id",
        SCAN_COLUMNS
    ))?;
    let scans = stmt
        .query_map(params![ScanStatus::Running], scan_from_row)?
        .collect::<DbResult<Vec<_>>>()?;
    Ok(scans)
}

/// Most recent scan records, newest first
pub fn recent_scans(conn: &Connection, limit: usize) -> DbResult<Vec<ScanRecord>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM scan_history ORDER BY id DESC LIMIT ?1",
        SCAN_COLUMNS
    ))?;
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let scans = stmt
        .query_map(params![limit], scan_from_row)?
        .collect::<DbResult<Vec<_>>>()?;
    Ok(scans)
}
