//! Error types for bazaar_scan

use thiserror::Error;

/// Unified error type for scanner operations
#[derive(Debug, Error)]
pub enum ScanError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Failed to parse JSON response
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// HTTP error status code
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),
    /// The Torn API answered with its own error object
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },
    /// Response parsed but is missing something we need
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Item catalog could not be refreshed; nothing can be scanned without it
    #[error("Catalog refresh failed: {0}")]
    CatalogRefresh(#[source] Box<ScanError>),
}

/// Result alias for scanner operations
pub type Result<T> = std::result::Result<T, ScanError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn api_error_display_includes_code() {
        let err = ScanError::Api {
            code: 6,
            message: "Incorrect ID".to_string(),
        };
        assert_eq!(err.to_string(), "API error 6: Incorrect ID");
    }

    #[test]
    fn catalog_refresh_exposes_source() {
        let inner = ScanError::MalformedResponse("missing 'items'".to_string());
        let err = ScanError::CatalogRefresh(Box::new(inner));
        assert!(err.to_string().contains("missing 'items'"));
        assert!(err.source().is_some());
    }

    #[test]
    fn database_error_converts() {
        let err: ScanError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, ScanError::Database(_)));
    }
}
