use super::client::{VertexEndpoint, VertexHttpClient};
use super::invoker::GeminiInvoker;
use crate::ai::auth::StaticTokenProvider;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

pub(crate) const GENERATE_CONTENT_PATH_REGEX: &str =
    r"^/v1/projects/[^/]+/locations/[^/]+/publishers/google/models/[^/]+:generateContent$";

pub(crate) fn post_path_regex(regex: &str) -> MockBuilder {
    Mock::given(method("POST")).and(path_regex(regex))
}

pub(crate) fn chunk_response(text: &str, finish_reason: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": finish_reason
        }]
    }))
}

pub(crate) fn http_client(server: &MockServer) -> VertexHttpClient {
    VertexHttpClient::new(
        VertexEndpoint::new(
            "test-project".to_string(),
            "us-central1".to_string(),
            "gemini-2.0-flash".to_string(),
        ),
        Duration::from_secs(5),
    )
    .with_base_url(server.uri())
}

pub(crate) fn invoker(server: &MockServer) -> GeminiInvoker {
    GeminiInvoker::new(
        http_client(server),
        Arc::new(StaticTokenProvider::new("test-token".to_string())),
    )
}
