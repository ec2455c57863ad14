//! Bazaar Scan - Torn bazaar snapshot collector
//!
//! Polls the Torn API for every registered seller's bazaar, normalizes the
//! listings against the item catalog and keeps a per-seller snapshot in SQLite.

pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod scanner;
pub mod torn;

pub use config::ScanConfig;
pub use database::{add_sellers, init_schema, open_database};
pub use error::{Result, ScanError};
pub use models::{CatalogItem, Listing, ScanRecord, ScanStatus, Seller};
pub use scanner::{ScanSummary, Scanner};
