use super::client::VertexHttpClient;
use super::types::{
    AttemptBudget, FinishReason, GenerateContentRequest, GenerationConfig, InvocationResult, Part,
    SystemInstruction, Turn,
};
use crate::ai::auth::TokenProvider;
use crate::ai::ModelInvoker;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Calls Gemini on Vertex AI, replaying truncated output as a model turn
/// until the model stops on its own or the attempt budget runs out.
pub struct GeminiInvoker {
    http: VertexHttpClient,
    credentials: Arc<dyn TokenProvider>,
}

impl GeminiInvoker {
    pub fn new(http: VertexHttpClient, credentials: Arc<dyn TokenProvider>) -> Self {
        Self { http, credentials }
    }
}

#[async_trait]
impl ModelInvoker for GeminiInvoker {
    async fn invoke(
        &self,
        conversation: &[Turn],
        system_instruction: Option<&str>,
        config: GenerationConfig,
        budget: AttemptBudget,
    ) -> Result<InvocationResult> {
        let token = self.credentials.access_token().await?;

        let system_instruction = system_instruction
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let mut working = conversation.to_vec();
        let mut accumulated = String::new();
        let mut finish_reason = FinishReason::Unspecified;
        let mut attempt = 0;

        while attempt < budget.get() {
            let request = GenerateContentRequest {
                contents: &working,
                system_instruction: system_instruction.as_ref().map(|text| SystemInstruction {
                    parts: vec![Part::text(text.clone())],
                }),
                generation_config: config,
            };

            tracing::debug!(
                "Sending generateContent request (attempt {}/{}, {} turns) to {}",
                attempt + 1,
                budget.get(),
                working.len(),
                self.http.endpoint().model
            );

            let (chunk, reason) = self
                .http
                .generate_content(&token.token, &request)
                .await?
                .into_chunk();

            accumulated.push_str(&chunk);
            finish_reason = reason;

            if finish_reason != FinishReason::MaxTokens {
                break;
            }

            tracing::warn!(
                "Response truncated at MAX_TOKENS after {} chars, requesting continuation",
                chunk.len()
            );
            working.push(Turn::model_text(chunk));
            attempt += 1;
        }

        Ok(InvocationResult {
            text: accumulated,
            finish_reason,
        })
    }
}
