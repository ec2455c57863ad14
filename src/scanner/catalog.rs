//! In-memory item catalog, refreshed once per scan

use crate::database;
use crate::error::Result;
use crate::models::CatalogItem;
use crate::torn::TornClient;
use chrono::Utc;
use rusqlite::Connection;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable catalog lookup by item ID
#[derive(Debug, Default)]
pub struct ItemCatalog {
    items: HashMap<i64, CatalogItem>,
}

impl ItemCatalog {
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.item_id, i)).collect(),
        }
    }

    /// Look up an item by its Torn item ID
    pub fn get(&self, item_id: i64) -> Option<&CatalogItem> {
        self.items.get(&item_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Holds the current catalog snapshot.
///
/// Each refresh swaps in a new `Arc<ItemCatalog>`; fetchers keep whatever
/// snapshot they were handed.
#[derive(Debug, Default)]
pub struct CatalogCache {
    current: Arc<ItemCatalog>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<ItemCatalog> {
        Arc::clone(&self.current)
    }

    /// Download the catalog, upsert it into `items`, and swap it in.
    ///
    /// On any failure the previous snapshot stays in place.
    pub async fn refresh(
        &mut self,
        client: &TornClient,
        conn: &mut Connection,
    ) -> Result<Arc<ItemCatalog>> {
        log::info!("Fetching item catalog from Torn API...");

        let response = client.fetch_items().await?;
        let items = response.into_catalog_items(Utc::now())?;
        database::upsert_items(conn, &items)?;

        let catalog = Arc::new(ItemCatalog::from_items(items));
        self.current = Arc::clone(&catalog);

        log::info!("Cached {} items", catalog.len());
        Ok(catalog)
    }
}
