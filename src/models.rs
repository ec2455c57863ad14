//! Core records shared by the scanner and the database layer

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

/// Fallback name when neither the listing nor the catalog knows the item
pub const UNKNOWN_ITEM_NAME: &str = "Unknown Item";

/// Fallback category for uncategorised items
pub const DEFAULT_CATEGORY: &str = "Miscellaneous";

/// A bazaar owner we poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Seller {
    pub seller_id: i64,
    /// `None` until the first fetch attempt
    pub last_checked: Option<DateTime<Utc>>,
    pub active: bool,
}

impl Seller {
    /// Scan ordering: never-checked sellers first, then oldest check first.
    /// Ties break on the identifier so the order is total.
    pub fn check_order(a: &Seller, b: &Seller) -> Ordering {
        match (a.last_checked, b.last_checked) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.cmp(&y),
        }
        .then(a.seller_id.cmp(&b.seller_id))
    }
}

/// Reference metadata for an item, refreshed from the catalog endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    pub item_id: i64,
    pub name: String,
    pub category: String,
    /// Weapon or drug type, empty for everything else
    pub subtype: String,
    pub market_value: i64,
    pub refreshed_at: DateTime<Utc>,
}

/// One bazaar line as captured at fetch time.
///
/// Name, category and market value are copies; they are never re-derived
/// from the catalog after insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    /// Row id, assigned by the database
    pub id: Option<i64>,
    pub item_id: Option<i64>,
    pub item_name: String,
    pub category: String,
    pub market_value: i64,
    pub price: i64,
    pub quantity: i64,
    pub seller_id: i64,
    pub seller_name: String,
    pub captured_at: DateTime<Utc>,
}

/// Lifecycle state of a scan record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Running,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Running => "running",
            ScanStatus::Completed => "completed",
            ScanStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "running" => Some(ScanStatus::Running),
            "completed" => Some(ScanStatus::Completed),
            "failed" => Some(ScanStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Persisted history entry for one scan run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRecord {
    pub id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub sellers_attempted: i64,
    pub listings_found: i64,
    pub status: ScanStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn seller(seller_id: i64, last_checked: Option<DateTime<Utc>>) -> Seller {
        Seller {
            seller_id,
            last_checked,
            active: true,
        }
    }

    #[test]
    fn never_checked_sellers_sort_first() {
        let old = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let new = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();

        let mut sellers = vec![
            seller(1, Some(new)),
            seller(2, None),
            seller(3, Some(old)),
            seller(4, None),
        ];
        sellers.sort_by(Seller::check_order);

        let ids: Vec<i64> = sellers.iter().map(|s| s.seller_id).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);
    }

    #[test]
    fn scan_status_round_trips_through_text() {
        for status in [ScanStatus::Running, ScanStatus::Completed, ScanStatus::Failed] {
            assert_eq!(ScanStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ScanStatus::parse("paused"), None);
    }
}
