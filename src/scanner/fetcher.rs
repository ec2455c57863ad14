//! Per-seller bazaar fetch and outcome classification

use crate::database;
use crate::error::Result;
use crate::models::{Listing, DEFAULT_CATEGORY, UNKNOWN_ITEM_NAME};
use crate::torn::{BazaarResponse, RawBazaarItem, TornClient};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::catalog::ItemCatalog;

/// What one bazaar request told us about a seller
#[derive(Debug, Clone, PartialEq)]
pub enum SellerFetchOutcome {
    /// Current bazaar contents; may be empty
    Listings(Vec<Listing>),
    /// Torn does not know this player ID
    NotFound,
    /// Network failure, rate-limit rejection, unparseable body or any other
    /// API error. The seller is retried on a later scan.
    TransientError(String),
}

/// Fetches and normalizes one seller's bazaar
#[derive(Debug, Clone)]
pub struct SellerFetcher {
    client: TornClient,
}

impl SellerFetcher {
    pub fn new(client: TornClient) -> Self {
        Self { client }
    }

    /// Fetch `seller_id`'s bazaar and classify the result.
    ///
    /// The seller's `last_checked` is updated before the outcome is returned,
    /// whatever the outcome is. `Err` means the update itself failed.
    pub async fn fetch(
        &self,
        conn: &Connection,
        seller_id: i64,
        catalog: &ItemCatalog,
    ) -> Result<SellerFetchOutcome> {
        let response = self.client.fetch_bazaar(seller_id).await;

        let checked_at = Utc::now();
        database::touch_seller(conn, seller_id, checked_at)?;

        Ok(classify(seller_id, response, catalog, checked_at))
    }
}

/// Turn a raw API result into an outcome, resolving item metadata from the
/// catalog where the bazaar entry leaves it out.
pub fn classify(
    seller_id: i64,
    response: Result<BazaarResponse>,
    catalog: &ItemCatalog,
    captured_at: DateTime<Utc>,
) -> SellerFetchOutcome {
    let response = match response {
        Ok(response) => response,
        Err(e) => return SellerFetchOutcome::TransientError(e.to_string()),
    };

    if let Some(error) = &response.error {
        if error.is_incorrect_id() {
            return SellerFetchOutcome::NotFound;
        }
        return SellerFetchOutcome::TransientError(format!(
            "API error {}: {}",
            error.code,
            error.message()
        ));
    }

    let seller_name = response
        .name
        .clone()
        .unwrap_or_else(|| format!("Player {}", seller_id));

    let listings = response
        .into_entries()
        .into_iter()
        .map(|(item_id, raw)| {
            normalize(seller_id, &seller_name, item_id, raw, catalog, captured_at)
        })
        .collect();

    SellerFetchOutcome::Listings(listings)
}

/// Bazaar fields win; the catalog only fills gaps; constants fill the rest.
fn normalize(
    seller_id: i64,
    seller_name: &str,
    item_id: Option<i64>,
    raw: RawBazaarItem,
    catalog: &ItemCatalog,
    captured_at: DateTime<Utc>,
) -> Listing {
    let known = item_id.and_then(|id| catalog.get(id));

    Listing {
        id: None,
        item_id,
        item_name: raw
            .name
            .or_else(|| known.map(|i| i.name.clone()))
            .unwrap_or_else(|| UNKNOWN_ITEM_NAME.to_string()),
        category: raw
            .category
            .or_else(|| known.map(|i| i.category.clone()))
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        market_value: raw
            .market_value
            .or_else(|| known.map(|i| i.market_value))
            .unwrap_or(0),
        price: raw.price.unwrap_or(0),
        quantity: raw.quantity.unwrap_or(1),
        seller_id,
        seller_name: seller_name.to_string(),
        captured_at,
    }
}
