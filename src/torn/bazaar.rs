//! Player bazaar payload (`selections=bazaar`)

use serde::Deserialize;
use std::collections::HashMap;

use super::ApiErrorBody;

/// One bazaar entry as Torn sends it. Any field may be missing.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawBazaarItem {
    /// Only present in the array form of the payload
    #[serde(default, rename = "ID", alias = "id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "type")]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<i64>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub market_value: Option<i64>,
}

/// Torn has served the bazaar both keyed by item ID and as a plain array
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BazaarEntries {
    Keyed(HashMap<String, RawBazaarItem>),
    Listed(Vec<RawBazaarItem>),
}

/// Top-level bazaar response
#[derive(Debug, Clone, Deserialize)]
pub struct BazaarResponse {
    /// Seller display name
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bazaar: Option<BazaarEntries>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

impl BazaarResponse {
    /// Flatten the bazaar into `(item_id, entry)` pairs ordered by item ID.
    ///
    /// Keys that are not integers yield `None` for the item ID.
    pub fn into_entries(self) -> Vec<(Option<i64>, RawBazaarItem)> {
        let mut entries: Vec<(Option<i64>, RawBazaarItem)> = match self.bazaar {
            None => Vec::new(),
            Some(BazaarEntries::Keyed(map)) => map
                .into_iter()
                .map(|(key, item)| (key.parse().ok().or(item.id), item))
                .collect(),
            Some(BazaarEntries::Listed(list)) => {
                list.into_iter().map(|item| (item.id, item)).collect()
            }
        };
        entries.sort_by_key(|(item_id, _)| *item_id);
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> BazaarResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn keyed_bazaar_is_flattened_in_id_order() {
        let response = parse(serde_json::json!({
            "name": "Trader",
            "bazaar": {
                "206": { "price": 900, "quantity": 5 },
                "18": { "name": "Knife", "price": 100 }
            }
        }));

        let entries = response.into_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, Some(18));
        assert_eq!(entries[0].1.name.as_deref(), Some("Knife"));
        assert_eq!(entries[1].0, Some(206));
        assert_eq!(entries[1].1.quantity, Some(5));
    }

    #[test]
    fn listed_bazaar_uses_entry_ids() {
        let response = parse(serde_json::json!({
            "bazaar": [
                { "ID": 206, "name": "Xanax", "type": "Drug", "price": 900, "quantity": 2 }
            ]
        }));

        let entries = response.into_entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, Some(206));
        assert_eq!(entries[0].1.category.as_deref(), Some("Drug"));
    }

    #[test]
    fn empty_shapes_yield_no_entries() {
        for json in [
            serde_json::json!({ "name": "A" }),
            serde_json::json!({ "bazaar": null }),
            serde_json::json!({ "bazaar": {} }),
            serde_json::json!({ "bazaar": [] }),
        ] {
            assert!(parse(json).into_entries().is_empty());
        }
    }

    #[test]
    fn non_numeric_key_has_no_item_id() {
        let response = parse(serde_json::json!({
            "bazaar": { "mystery": { "name": "Box", "price": 1 } }
        }));
        let entries = response.into_entries();
        assert_eq!(entries[0].0, None);
    }

    #[test]
    fn error_object_is_captured() {
        let response = parse(serde_json::json!({
            "error": { "code": 6, "error": "Incorrect ID" }
        }));
        let error = response.error.unwrap();
        assert!(error.is_incorrect_id());
        assert_eq!(error.message(), "Incorrect ID");
    }
}
