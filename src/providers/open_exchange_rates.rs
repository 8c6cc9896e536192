use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::cache::Cache;
use crate::core::currency::RateTableProvider;
use crate::core::rates::{ANCHOR_CURRENCY, RateTable};

/// Fetches the latest USD-anchored table from an Open Exchange Rates compatible API.
pub struct OpenExchangeRatesProvider {
    base_url: String,
    app_id: String,
    cache: Arc<Cache<String, RateTable>>,
    ttl: Duration,
}

impl OpenExchangeRatesProvider {
    pub fn new(
        base_url: &str,
        app_id: &str,
        cache: Arc<Cache<String, RateTable>>,
        ttl: Duration,
    ) -> Self {
        OpenExchangeRatesProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
            cache,
            ttl,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    base: Option<String>,
    timestamp: Option<i64>,
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateTableProvider for OpenExchangeRatesProvider {
    #[instrument(name = "OpenExchangeRatesFetch", skip(self))]
    async fn fetch_table(&self) -> Result<RateTable> {
        let key = ANCHOR_CURRENCY.to_string();
        if let Some(cached) = self.cache.get(&key).await {
            return Ok(cached);
        }

        let endpoint = format!("{}/api/latest.json", self.base_url);
        debug!("Requesting rate table from {}", endpoint);
        let url = format!(
            "{}?app_id={}&base={}",
            endpoint, self.app_id, ANCHOR_CURRENCY
        );

        let client = reqwest::Client::builder()
            .user_agent("currenz/0.1")
            .build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                anyhow!(
                    "Request error: {} for base: {}",
                    e.without_url(),
                    ANCHOR_CURRENCY
                )
            })?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for base: {}",
                response.status(),
                ANCHOR_CURRENCY
            ));
        }

        let text = response.text().await.map_err(|e| {
            anyhow!(
                "Failed to read response for base: {}: {}",
                ANCHOR_CURRENCY,
                e.without_url()
            )
        })?;
        let data: LatestRatesResponse = serde_json::from_str(&text).map_err(|e| {
            anyhow!(
                "Failed to parse JSON response for {}: {}",
                ANCHOR_CURRENCY,
                e
            )
        })?;

        if let Some(base) = &data.base {
            if !base.eq_ignore_ascii_case(ANCHOR_CURRENCY) {
                return Err(anyhow!(
                    "Unexpected base currency in response: {}",
                    base
                ));
            }
        }
        if data.rates.is_empty() {
            return Err(anyhow!("No rate data found for base: {}", ANCHOR_CURRENCY));
        }

        let mut table = RateTable::new(ANCHOR_CURRENCY, data.rates);
        if let Some(as_of) = data
            .timestamp
            .and_then(|ts| Utc.timestamp_opt(ts, 0).single())
        {
            table = table.with_timestamp(as_of);
        }
        debug!("Received {} rates", table.rates.len());

        self.cache.put(key, table.clone(), Some(self.ttl)).await;
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LATEST_PATH: &str = "/api/latest.json";

    async fn create_mock_server(status: u16, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(LATEST_PATH))
            .and(query_param("app_id", "test-key"))
            .and(query_param("base", "USD"))
            .respond_with(ResponseTemplate::new(status).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    fn provider(mock_server: &MockServer) -> OpenExchangeRatesProvider {
        OpenExchangeRatesProvider::new(
            &mock_server.uri(),
            "test-key",
            Arc::new(Cache::new()),
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_successful_table_fetch() {
        let mock_response = r#"{
            "disclaimer": "Usage subject to terms",
            "base": "USD",
            "timestamp": 1700000000,
            "rates": {
                "EUR": 0.9,
                "JPY": 150.0,
                "USD": 1
            }
        }"#;
        let mock_server = create_mock_server(200, mock_response).await;

        let table = provider(&mock_server).fetch_table().await.unwrap();
        assert_eq!(table.anchor, "USD");
        assert_eq!(table.get("EUR"), Some(0.9));
        assert_eq!(table.get("JPY"), Some(150.0));
        assert_eq!(table.as_of.unwrap().timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn test_table_is_cached() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LATEST_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"rates": {"EUR": 0.9}}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = provider(&mock_server);
        provider.fetch_table().await.unwrap();
        let table = provider.fetch_table().await.unwrap();
        assert_eq!(table.get("EUR"), Some(0.9));
        assert!(table.as_of.is_none());
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let mock_server = create_mock_server(500, "").await;

        let result = provider(&mock_server).fetch_table().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for base: USD"
        );
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LATEST_PATH))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&mock_server)
            .await;

        let provider = provider(&mock_server);
        assert!(provider.fetch_table().await.is_err());
        assert!(provider.fetch_table().await.is_err());
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_mock_server(200, r#"{"base": "USD", "rate": {}}"#).await;

        let result = provider(&mock_server).fetch_table().await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for USD")
        );
    }

    #[tokio::test]
    async fn test_empty_rates() {
        let mock_server = create_mock_server(200, r#"{"base": "USD", "rates": {}}"#).await;

        let result = provider(&mock_server).fetch_table().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No rate data found for base: USD"
        );
    }

    #[tokio::test]
    async fn test_unexpected_base() {
        let mock_server =
            create_mock_server(200, r#"{"base": "EUR", "rates": {"USD": 1.1}}"#).await;

        let result = provider(&mock_server).fetch_table().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Unexpected base currency in response: EUR"
        );
    }

    #[tokio::test]
    async fn test_errors_never_expose_app_id() {
        let unreachable = {
            let mock_server = MockServer::start().await;
            provider(&mock_server)
        };
        let server_error = create_mock_server(500, "").await;
        let malformed = create_mock_server(200, "not json").await;

        let errors = [
            unreachable.fetch_table().await.unwrap_err(),
            provider(&server_error).fetch_table().await.unwrap_err(),
            provider(&malformed).fetch_table().await.unwrap_err(),
        ];
        for err in errors {
            let rendered = format!("{err:#} {err:?}");
            assert!(!rendered.contains("test-key"), "app_id leaked: {rendered}");
        }
    }
}
