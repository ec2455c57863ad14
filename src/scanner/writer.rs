//! Batched snapshot writes

use crate::database;
use crate::error::Result;
use crate::models::Listing;
use rusqlite::Connection;

/// Listings accumulated since the last flush, plus every seller whose fetch
/// succeeded (including empty bazaars, whose old rows must go too).
#[derive(Debug, Default)]
pub struct SnapshotBatch {
    sellers: Vec<i64>,
    listings: Vec<Listing>,
}

impl SnapshotBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one seller's complete fetch result
    pub fn push(&mut self, seller_id: i64, listings: Vec<Listing>) {
        self.sellers.push(seller_id);
        self.listings.extend(listings);
    }

    /// Number of accumulated listings (the flush trigger)
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    /// True when no seller has been added since the last flush
    pub fn is_empty(&self) -> bool {
        self.sellers.is_empty()
    }

    pub fn seller_count(&self) -> usize {
        self.sellers.len()
    }

    /// True once either the listings or the sellers reach `threshold`.
    ///
    /// Counting sellers keeps a run of empty bazaars from piling up deletes.
    pub fn is_full(&self, threshold: usize) -> bool {
        self.listings.len() >= threshold || self.sellers.len() >= threshold
    }

    pub fn take(&mut self) -> SnapshotBatch {
        std::mem::take(self)
    }
}

/// Applies batches to the listings table
#[derive(Debug, Default)]
pub struct SnapshotWriter {
    batch_sizes: Vec<usize>,
}

impl SnapshotWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the listings of every seller in `batch` atomically.
    ///
    /// An empty batch is a no-op and is not counted as a flush.
    pub fn flush(&mut self, conn: &mut Connection, batch: SnapshotBatch) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let inserted = database::replace_listings(conn, &batch.sellers, &batch.listings)?;
        self.batch_sizes.push(inserted);

        log::info!(
            "Stored {} listings for {} sellers",
            inserted,
            batch.seller_count()
        );
        Ok(inserted)
    }

    /// Number of batches written so far
    pub fn flushes(&self) -> usize {
        self.batch_sizes.len()
    }

    /// Listings inserted by each flush, in order
    pub fn batch_sizes(&self) -> &[usize] {
        &self.batch_sizes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn listing(seller_id: i64, item_id: i64) -> Listing {
        Listing {
            id: None,
            item_id: Some(item_id),
            item_name: "Xanax".to_string(),
            category: "Drug".to_string(),
            market_value: 850,
            price: 900,
            quantity: 1,
            seller_id,
            seller_name: "Trader".to_string(),
            captured_at: Utc::now(),
        }
    }

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        database::init_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn batch_counts_listings_but_tracks_sellers() {
        let mut batch = SnapshotBatch::new();
        assert!(batch.is_empty());

        batch.push(1, vec![]);
        assert!(!batch.is_empty());
        assert_eq!(batch.len(), 0);

        batch.push(2, vec![listing(2, 100), listing(2, 101)]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.seller_count(), 2);

        let taken = batch.take();
        assert_eq!(taken.len(), 2);
        assert!(batch.is_empty());
    }

    #[test]
    fn batch_fills_on_listings_or_sellers() {
        let mut batch = SnapshotBatch::new();
        batch.push(1, vec![listing(1, 100), listing(1, 101), listing(1, 102)]);
        assert!(batch.is_full(3));

        let mut empties = SnapshotBatch::new();
        empties.push(1, vec![]);
        empties.push(2, vec![]);
        assert!(!empties.is_full(3));
        empties.push(3, vec![]);
        assert!(empties.is_full(3));
    }

    #[test]
    fn flush_writes_and_counts() {
        let mut conn = test_db();
        let mut writer = SnapshotWriter::new();

        let mut batch = SnapshotBatch::new();
        batch.push(1, vec![listing(1, 100)]);
        batch.push(2, vec![listing(2, 100), listing(2, 101)]);

        assert_eq!(writer.flush(&mut conn, batch).unwrap(), 3);
        assert_eq!(writer.flushes(), 1);
        assert_eq!(writer.batch_sizes(), &[3]);
        assert_eq!(database::get_listing_count(&conn).unwrap(), 3);
    }

    #[test]
    fn empty_batch_is_not_flushed() {
        let mut conn = test_db();
        let mut writer = SnapshotWriter::new();

        assert_eq!(writer.flush(&mut conn, SnapshotBatch::new()).unwrap(), 0);
        assert_eq!(writer.flushes(), 0);
    }

    #[test]
    fn empty_bazaar_clears_previous_listings() {
        let mut conn = test_db();
        let mut writer = SnapshotWriter::new();

        let mut first = SnapshotBatch::new();
        first.push(1, vec![listing(1, 100)]);
        writer.flush(&mut conn, first).unwrap();

        let mut second = SnapshotBatch::new();
        second.push(1, vec![]);
        writer.flush(&mut conn, second).unwrap();

        assert!(database::listings_for_seller(&conn, 1).unwrap().is_empty());
    }
}
