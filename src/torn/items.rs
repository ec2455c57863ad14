//! Item catalog payload (`selections=items`)

use crate::error::{Result, ScanError};
use crate::models::{CatalogItem, DEFAULT_CATEGORY};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use super::ApiErrorBody;

/// Catalog name used when Torn omits one
const UNKNOWN_CATALOG_NAME: &str = "Unknown";

/// Raw catalog entry; every field is optional in practice
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub item_type: Option<String>,
    #[serde(default)]
    pub weapon_type: Option<String>,
    #[serde(default)]
    pub drug_type: Option<String>,
    #[serde(default)]
    pub market_value: Option<i64>,
}

/// Top-level catalog response
#[derive(Debug, Deserialize)]
pub struct ItemsResponse {
    #[serde(default)]
    pub items: Option<HashMap<String, RawItem>>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

impl ItemsResponse {
    /// Convert the payload into catalog entries stamped with `refreshed_at`.
    ///
    /// Fails on an API error object, a missing `items` key, or an item key
    /// that is not an integer.
    pub fn into_catalog_items(self, refreshed_at: DateTime<Utc>) -> Result<Vec<CatalogItem>> {
        if let Some(error) = self.error {
            return Err(ScanError::Api {
                code: error.code,
                message: error.message().to_string(),
            });
        }

        let items = self
            .items
            .ok_or_else(|| ScanError::MalformedResponse("'items' not found".to_string()))?;

        let mut catalog = Vec::with_capacity(items.len());
        for (key, raw) in items {
            let item_id: i64 = key.parse().map_err(|_| {
                ScanError::MalformedResponse(format!("item id '{}' is not an integer", key))
            })?;
            catalog.push(raw.into_catalog_item(item_id, refreshed_at));
        }
        catalog.sort_by_key(|item| item.item_id);
        Ok(catalog)
    }
}

impl RawItem {
    fn into_catalog_item(self, item_id: i64, refreshed_at: DateTime<Utc>) -> CatalogItem {
        let subtype = non_empty(self.weapon_type)
            .or_else(|| non_empty(self.drug_type))
            .unwrap_or_default();

        CatalogItem {
            item_id,
            name: self.name.unwrap_or_else(|| UNKNOWN_CATALOG_NAME.to_string()),
            category: self.item_type.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            subtype,
            market_value: self.market_value.unwrap_or(0),
            refreshed_at,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Result<Vec<CatalogItem>> {
        let response: ItemsResponse = serde_json::from_value(json).unwrap();
        response.into_catalog_items(Utc::now())
    }

    #[test]
    fn parses_items_with_defaults() {
        let items = parse(serde_json::json!({
            "items": {
                "206": { "name": "Xanax", "type": "Drug", "drug_type": "Anti-anxiety", "market_value": 850 },
                "1": { "name": "Hammer", "type": "Melee", "weapon_type": "Clubbing", "drug_type": null },
                "9": {}
            }
        }))
        .unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].item_id, 1);
        assert_eq!(items[0].subtype, "Clubbing");
        assert_eq!(items[0].market_value, 0);

        assert_eq!(items[1].name, "Unknown");
        assert_eq!(items[1].category, "Miscellaneous");
        assert_eq!(items[1].subtype, "");

        assert_eq!(items[2].name, "Xanax");
        assert_eq!(items[2].subtype, "Anti-anxiety");
        assert_eq!(items[2].market_value, 850);
    }

    #[test]
    fn missing_items_key_is_malformed() {
        let err = parse(serde_json::json!({ "something": {} })).unwrap_err();
        assert!(matches!(err, ScanError::MalformedResponse(_)));
    }

    #[test]
    fn api_error_object_is_reported() {
        let err = parse(serde_json::json!({
            "error": { "code": 2, "error": "Incorrect key" }
        }))
        .unwrap_err();
        assert!(matches!(err, ScanError::Api { code: 2, .. }));
    }

    #[test]
    fn non_numeric_item_key_is_malformed() {
        let err = parse(serde_json::json!({ "items": { "abc": { "name": "x" } } })).unwrap_err();
        assert!(matches!(err, ScanError::MalformedResponse(_)));
    }
}
