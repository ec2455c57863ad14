//! HTTP plumbing for the Torn API
//!
//! Uses async reqwest. Every request carries the API key as a query
//! parameter; the key never appears in log output.

use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use serde::de::DeserializeOwned;
use std::fmt;

use super::{BazaarResponse, ItemsResponse};

const USER_AGENT: &str = "bazaar_scan/1.0";

/// Thin Torn API client bound to one API key
#[derive(Clone)]
pub struct TornClient {
    client: reqwest::Client,
    pub(crate) base_url: String,
    api_key: String,
}

impl fmt::Debug for TornClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TornClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TornClient {
    /// Build a client from the scan configuration
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Fetch the full item catalog (`/torn/?selections=items`)
    pub async fn fetch_items(&self) -> Result<ItemsResponse> {
        self.get_json("/torn/", "items").await
    }

    /// Fetch one player's bazaar (`/user/{id}?selections=bazaar`)
    pub async fn fetch_bazaar(&self, seller_id: i64) -> Result<BazaarResponse> {
        self.get_json(&format!("/user/{}", seller_id), "bazaar").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, selections: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        log::debug!("GET {}?selections={}", url, selections);

        let response = self
            .client
            .get(&url)
            .query(&[("selections", selections), ("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::HttpStatus(status));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> TornClient {
        let config = ScanConfig::new("test_key").with_base_url(server.uri());
        TornClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn fetch_bazaar_sends_key_and_selection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/1111111"))
            .and(query_param("selections", "bazaar"))
            .and(query_param("key", "test_key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "Trader",
                "bazaar": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client_for(&server).fetch_bazaar(1111111).await.unwrap();
        assert_eq!(response.name.as_deref(), Some("Trader"));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/torn/"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_items().await.unwrap_err();
        assert!(matches!(err, ScanError::HttpStatus(s) if s.as_u16() == 502));
    }

    #[tokio::test]
    async fn invalid_json_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user/5"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).fetch_bazaar(5).await.unwrap_err();
        assert!(matches!(err, ScanError::Parse(_)));
    }
}
