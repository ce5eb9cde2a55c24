//! qka HTTP client implementation

use std::collections::HashMap;
use std::time::Duration;

use qka_core::{Envelope, OperationDescriptor, OperationList, CREDENTIAL_HEADER};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{QkaClientError, Result};
use crate::types::{BarsRequest, DailyBar, DownloadRequest};

/// Default request timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default connection timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client proxy for a qka gateway.
///
/// Every call becomes `POST /api/{operation}` with the parameters as a JSON
/// object and the shared token in the `X-Token` header. Successful envelopes
/// yield their `data`; failure envelopes become a typed error.
#[derive(Debug, Clone)]
pub struct QkaClient {
    client: Client,
    base_url: Url,
}

impl QkaClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the gateway (e.g., "http://127.0.0.1:8000")
    /// * `token` - Shared secret printed by the gateway at startup
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        Self::with_config(base_url, token, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Create a new client with custom timeouts
    pub fn with_config(
        base_url: &str,
        token: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        if token.is_empty() {
            return Err(QkaClientError::MissingToken);
        }

        let mut headers = HeaderMap::new();
        let header_value = HeaderValue::from_str(token)
            .map_err(|e| QkaClientError::Parse(format!("Invalid token: {}", e)))?;
        headers.insert(CREDENTIAL_HEADER, header_value);

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .default_headers(headers)
            .build()?;

        let base_url = Url::parse(base_url)?;

        Ok(Self { client, base_url })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // =========================================================================
    // Generic dispatch
    // =========================================================================

    /// Invoke an operation by name and return its normalized result
    #[instrument(skip(self, params))]
    pub async fn call<P>(&self, operation: &str, params: P) -> Result<Value>
    where
        P: Serialize,
    {
        let url = self.base_url.join(&format!("/api/{}", operation))?;
        let body = serde_json::to_value(params)
            .map_err(|e| QkaClientError::Parse(format!("Unserializable parameters: {}", e)))?;
        debug!("Calling {}", url);

        let response = self.client.post(url).json(&body).send().await?;
        self.handle_response(response).await
    }

    /// Invoke an operation and deserialize its result into `T`
    pub async fn call_as<T, P>(&self, operation: &str, params: P) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize,
    {
        let data = self.call(operation, params).await?;
        serde_json::from_value(data).map_err(|e| QkaClientError::Parse(e.to_string()))
    }

    // =========================================================================
    // Gateway
    // =========================================================================

    /// Check gateway liveness
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<String> {
        let url = self.base_url.join("/health")?;
        let response = self.client.get(url).send().await?;

        if response.status().is_success() {
            Ok(response.text().await?)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// List every operation the gateway exposes, with parameter schemas
    #[instrument(skip(self))]
    pub async fn list_operations(&self) -> Result<Vec<OperationDescriptor>> {
        let url = self.base_url.join("/api")?;
        let response = self.client.get(url).send().await?;
        let data = self.handle_response(response).await?;
        serde_json::from_value::<OperationList>(data)
            .map(|list| list.items)
            .map_err(|e| QkaClientError::Parse(e.to_string()))
    }

    // =========================================================================
    // Market data
    // =========================================================================

    /// Append the exchange suffix to a 6-digit stock code
    pub async fn add_stock_suffix(&self, stock_code: &str) -> Result<String> {
        self.call_as("add_stock_suffix", json!({ "stock_code": stock_code }))
            .await
    }

    pub async fn add_stock_suffix_list(&self, stock_list: &[&str]) -> Result<Vec<String>> {
        self.call_as("add_stock_suffix_list", json!({ "stock_list": stock_list }))
            .await
    }

    /// Board a stock is listed on (主板, 创业板, 科创板, 北交所)
    pub async fn get_stock_market_type(&self, stock_code: &str) -> Result<String> {
        self.call_as("get_stock_market_type", json!({ "stock_code": stock_code }))
            .await
    }

    /// Trading days in `[start_time, end_time]`
    pub async fn get_trade_calendar(
        &self,
        start_time: &str,
        end_time: &str,
        format: &str,
    ) -> Result<Vec<String>> {
        self.call_as(
            "get_trade_calendar",
            json!({ "start_time": start_time, "end_time": end_time, "format": format }),
        )
        .await
    }

    pub async fn get_stock_list_in_sector(&self, sector_name: &str) -> Result<Vec<String>> {
        self.call_as("get_stock_list_in_sector", json!({ "sector_name": sector_name }))
            .await
    }

    pub async fn get_stock_list_in_main_board(&self) -> Result<Vec<String>> {
        self.call_as("get_stock_list_in_main_board", json!({})).await
    }

    /// Ask the gateway to fetch history for a set of codes
    pub async fn download_stock_history_data(&self, request: &DownloadRequest) -> Result<bool> {
        self.call_as("download_stock_history_data", request).await
    }

    /// Bars per code, as rows of `time, open, high, low, close, volume, amount`
    pub async fn get_daily_bars(
        &self,
        request: &BarsRequest,
    ) -> Result<HashMap<String, Vec<DailyBar>>> {
        self.call_as("get_daily_bars", request).await
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Unwrap the envelope of a response
    async fn handle_response(&self, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let bytes = response.bytes().await?;

        match serde_json::from_slice::<Envelope>(&bytes) {
            Ok(envelope) => envelope
                .into_result()
                .map_err(|detail| QkaClientError::from_envelope(status.as_u16(), detail)),
            Err(e) if status.is_success() => Err(QkaClientError::Parse(e.to_string())),
            Err(_) => Err(QkaClientError::Transport(format!(
                "HTTP {}: {}",
                status,
                String::from_utf8_lossy(&bytes).trim()
            ))),
        }
    }

    /// Extract error from a failed non-envelope endpoint
    async fn extract_error(&self, response: reqwest::Response) -> QkaClientError {
        let status = response.status();
        match response.json::<Envelope>().await {
            Ok(envelope) => QkaClientError::from_envelope(
                status.as_u16(),
                envelope.detail.unwrap_or_default(),
            ),
            Err(_) => QkaClientError::Transport(format!("HTTP {}", status)),
        }
    }
}
