use super::types::{GenerateContentRequest, GenerateContentResponse};
use crate::{Error, Result};
use reqwest::Client;
use std::time::Duration;

/// Fixed project/region/model triple identifying the Vertex AI endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexEndpoint {
    pub project: String,
    pub location: String,
    pub model: String,
}

impl VertexEndpoint {
    /// `model` may be given with or without a `models/` prefix.
    pub fn new(project: String, location: String, model: String) -> Self {
        let model = model.strip_prefix("models/").unwrap_or(&model).to_string();
        Self {
            project,
            location,
            model,
        }
    }

    fn default_base_url(&self) -> String {
        format!("https://{}-aiplatform.googleapis.com", self.location)
    }

    fn generate_content_path(&self) -> String {
        format!(
            "/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.project, self.location, self.model
        )
    }
}

/// Lightweight Vertex AI REST client for `generateContent`.
pub struct VertexHttpClient {
    client: Client,
    endpoint: VertexEndpoint,
    base_url: String,
    timeout: Duration,
}

impl VertexHttpClient {
    pub fn new(endpoint: VertexEndpoint, timeout: Duration) -> Self {
        Self::new_with_client(endpoint, timeout, Client::new())
    }

    pub fn new_with_client(endpoint: VertexEndpoint, timeout: Duration, client: Client) -> Self {
        Self {
            client,
            base_url: endpoint.default_base_url(),
            endpoint,
            timeout,
        }
    }

    /// Point the client at an emulator or stub server.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn endpoint(&self) -> &VertexEndpoint {
        &self.endpoint
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.endpoint.generate_content_path())
    }

    /// Issues one `generateContent` call.
    ///
    /// A body that does not match the expected envelope decodes to an empty
    /// response rather than an error.
    pub(crate) async fn generate_content(
        &self,
        token: &str,
        request: &GenerateContentRequest<'_>,
    ) -> Result<GenerateContentResponse> {
        let response = self
            .client
            .post(self.url())
            .timeout(self.timeout)
            .bearer_auth(token)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Vertex AI: {}", e);
                Error::upstream_transport(e)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(Error::upstream_transport)?;

        if !status.is_success() {
            tracing::error!("Vertex AI error (status {}): {}", status, body);
            return Err(Error::UpstreamRequest {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        Ok(GenerateContentResponse::from_body(&body))
    }
}
