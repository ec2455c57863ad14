//! Scan configuration

use std::fmt;
use std::time::Duration;

/// Default Torn API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.torn.com";

/// Default pause between consecutive seller requests
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(600);

/// Default number of accumulated listings that triggers a flush
pub const DEFAULT_FLUSH_THRESHOLD: usize = 100;

/// Default HTTP timeout per request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a scan needs besides the database handle
#[derive(Clone)]
pub struct ScanConfig {
    /// Torn API key (opaque, never logged)
    pub api_key: String,
    /// API base URL, overridden in tests
    pub base_url: String,
    /// Minimum pause between seller requests
    pub min_interval: Duration,
    /// Flush the accumulated batch once it holds this many listings
    pub flush_threshold: usize,
    /// Optional cap on sellers per scan
    pub limit: Option<usize>,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
}

impl ScanConfig {
    /// Create a config with defaults for everything but the API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            min_interval: DEFAULT_MIN_INTERVAL,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            limit: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// Set the flush threshold (0 is treated as 1)
    pub fn with_flush_threshold(mut self, flush_threshold: usize) -> Self {
        self.flush_threshold = flush_threshold.max(1);
        self
    }

    /// Cap the sellers per scan (`Some(0)` means no cap)
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit.filter(|&n| n > 0);
        self
    }
}

impl fmt::Debug for ScanConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("min_interval", &self.min_interval)
            .field("flush_threshold", &self.flush_threshold)
            .field("limit", &self.limit)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_api_budget() {
        let config = ScanConfig::new("key");
        assert_eq!(config.base_url, "https://api.torn.com");
        assert_eq!(config.min_interval, Duration::from_millis(600));
        assert_eq!(config.flush_threshold, 100);
        assert!(config.limit.is_none());
    }

    #[test]
    fn zero_flush_threshold_is_clamped() {
        let config = ScanConfig::new("key").with_flush_threshold(0);
        assert_eq!(config.flush_threshold, 1);
    }

    #[test]
    fn zero_limit_means_no_cap() {
        let config = ScanConfig::new("key").with_limit(Some(0));
        assert!(config.limit.is_none());

        let config = ScanConfig::new("key").with_limit(Some(25));
        assert_eq!(config.limit, Some(25));
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = ScanConfig::new("secret-key");
        assert!(!format!("{:?}", config).contains("secret-key"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = ScanConfig::new("key").with_base_url("http://127.0.0.1:8080/");
        assert_eq!(config.base_url, "http://127.0.0.1:8080");
    }
}
