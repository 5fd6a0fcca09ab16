//! Wires configuration, credentials, the model invoker, and the document store
//! into a single entry point for the handlers.

use crate::ai::{
    GeminiInvoker, MetadataTokenProvider, ModelInvoker, StaticTokenProvider, TokenProvider,
    VertexEndpoint, VertexHttpClient,
};
use crate::handlers::{chat, ocr, questions, CallContext, CallResult};
use crate::models::{
    ChatRequest, ChatResponse, Config, ExtractTextRequest, ExtractTextResponse,
    GenerateQuestionsRequest, GenerateQuestionsResponse,
};
use crate::store::DocumentStore;
use std::sync::Arc;
use tracing::info;

pub struct App {
    invoker: Box<dyn ModelInvoker>,
    store: Box<dyn DocumentStore>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub invoker: Box<dyn ModelInvoker>,
    pub store: Box<dyn DocumentStore>,
}

impl App {
    pub fn with_services(services: AppServices) -> Self {
        Self {
            invoker: services.invoker,
            store: services.store,
        }
    }

    /// Build the Vertex AI invoker described by `config` around `store`.
    pub fn from_config(config: &Config, store: Box<dyn DocumentStore>) -> Self {
        // One connection pool for both the token and model endpoints.
        let http_client = reqwest::Client::new();

        let credentials: Arc<dyn TokenProvider> = match &config.access_token {
            Some(token) => {
                info!("Using access token from VERTEX_ACCESS_TOKEN");
                Arc::new(StaticTokenProvider::new(token.clone()))
            }
            None => {
                info!("Using metadata server credentials");
                Arc::new(MetadataTokenProvider::new(
                    http_client.clone(),
                    config.request_timeout,
                ))
            }
        };

        let endpoint = VertexEndpoint::new(
            config.project.clone(),
            config.location.clone(),
            config.model.clone(),
        );
        info!(
            "Model: {} (project {}, location {})",
            endpoint.model, endpoint.project, endpoint.location
        );

        let http = VertexHttpClient::new_with_client(endpoint, config.request_timeout, http_client);

        Self::with_services(AppServices {
            invoker: Box::new(GeminiInvoker::new(http, credentials)),
            store,
        })
    }

    pub fn invoker(&self) -> &dyn ModelInvoker {
        self.invoker.as_ref()
    }

    pub async fn chat_reply(
        &self,
        ctx: &CallContext,
        request: ChatRequest,
    ) -> CallResult<ChatResponse> {
        chat::reply(self.invoker.as_ref(), self.store.as_ref(), ctx, request).await
    }

    /// OCR an image; with `strict`, empty output is reported as not-found.
    pub async fn extract_text(
        &self,
        ctx: &CallContext,
        request: ExtractTextRequest,
        strict: bool,
    ) -> CallResult<ExtractTextResponse> {
        if strict {
            ocr::extract_text_strict(self.invoker.as_ref(), ctx, request).await
        } else {
            ocr::extract_text(self.invoker.as_ref(), ctx, request).await
        }
    }

    pub async fn generate_questions(
        &self,
        ctx: &CallContext,
        request: GenerateQuestionsRequest,
    ) -> CallResult<GenerateQuestionsResponse> {
        questions::generate_from_image(self.invoker.as_ref(), self.store.as_ref(), ctx, request)
            .await
    }
}
