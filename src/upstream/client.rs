//! Authenticated JSON client for the telemetry API

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use crate::auth::TokenCache;
use crate::error::{BridgeError, Result};

/// Fetch capability consumed by the snapshot builder
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<Value>;

    async fn post(&self, url: &str, body: &Value) -> Result<Value>;
}

/// Shared HTTP client for token exchange and data calls
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Attaches a valid bearer token to every request
pub struct ApiClient {
    http_client: Client,
    tokens: Arc<TokenCache>,
}

impl ApiClient {
    pub fn new(http_client: Client, tokens: Arc<TokenCache>) -> Self {
        Self {
            http_client,
            tokens,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let token = self.tokens.get_valid_token().await?;

        let resp = request
            .bearer_auth(token)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(BridgeError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body)
            .map_err(|e| BridgeError::malformed(format!("invalid JSON body: {}", e)))
    }
}

#[async_trait]
impl Fetcher for ApiClient {
    async fn get(&self, url: &str) -> Result<Value> {
        tracing::trace!("[ApiClient] GET {}", url);
        self.send(self.http_client.get(url)).await
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        tracing::trace!("[ApiClient] POST {}", url);
        self.send(self.http_client.post(url).body(body.to_string()))
            .await
    }
}
