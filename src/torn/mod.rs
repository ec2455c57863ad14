//! Torn API client for the item catalog and player bazaars

mod bazaar;
mod client;
mod items;

pub use bazaar::{BazaarEntries, BazaarResponse, RawBazaarItem};
pub use client::TornClient;
pub use items::{ItemsResponse, RawItem};

use serde::Deserialize;

/// Error code Torn uses for an unknown or unregistered player ID
pub const INCORRECT_ID_CODE: i64 = 6;

/// The `error` object Torn returns instead of the requested selection
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiErrorBody {
    pub code: i64,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiErrorBody {
    pub fn message(&self) -> &str {
        self.error.as_deref().unwrap_or("Unknown error")
    }

    pub fn is_incorrect_id(&self) -> bool {
        self.code == INCORRECT_ID_CODE
    }
}
