//! Bearer credential acquisition for Vertex AI.
//!
//! Tokens are fetched fresh for every invocation; caching belongs to whoever
//! wraps a provider.

use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_METADATA_BASE_URL: &str = "http://metadata.google.internal";
const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
}

#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken>;
}

/// Pre-issued token, e.g. the output of `gcloud auth print-access-token`.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: String) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        if self.token.trim().is_empty() {
            return Err(Error::UpstreamAuth("Static access token is empty".to_string()));
        }
        Ok(AccessToken {
            token: self.token.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    access_token: String,
}

/// Default service account token from the GCE / Cloud Run metadata server.
pub struct MetadataTokenProvider {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl MetadataTokenProvider {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            base_url: DEFAULT_METADATA_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl TokenProvider for MetadataTokenProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        tracing::debug!("Fetching access token from metadata server");

        let response = self
            .client
            .get(format!("{}{}", self.base_url, METADATA_TOKEN_PATH))
            .timeout(self.timeout)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach metadata server: {}", e);
                Error::UpstreamAuth(format!("Metadata server unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Metadata server error (status {}): {}", status, body);
            return Err(Error::UpstreamAuth(format!(
                "Metadata server error (status {}): {}",
                status, body
            )));
        }

        let parsed: MetadataTokenResponse = response
            .json()
            .await
            .map_err(|e| Error::UpstreamAuth(format!("Invalid token response: {}", e)))?;

        if parsed.access_token.is_empty() {
            return Err(Error::UpstreamAuth(
                "Metadata server returned an empty token".to_string(),
            ));
        }

        Ok(AccessToken {
            token: parsed.access_token,
        })
    }
}
