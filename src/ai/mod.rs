//! Generative-model integration
//!
//! Wraps Gemini on Vertex AI behind the [`ModelInvoker`] trait so handlers can
//! be exercised against a scripted mock.

pub mod auth;
pub mod gemini;
pub mod mime;
pub mod mock;

pub use auth::{AccessToken, MetadataTokenProvider, StaticTokenProvider, TokenProvider};
pub use gemini::{
    AttemptBudget, FinishReason, GeminiInvoker, GenerationConfig, InvocationResult, Part, Role,
    Turn, VertexEndpoint, VertexHttpClient,
};
pub use mock::MockModelInvoker;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// Runs one logical invocation: at most `budget` requests, continuing
    /// while the model reports `MAX_TOKENS`.
    ///
    /// Empty text is a valid result; only credential and transport failures
    /// are errors.
    async fn invoke(
        &self,
        conversation: &[Turn],
        system_instruction: Option<&str>,
        config: GenerationConfig,
        budget: AttemptBudget,
    ) -> Result<InvocationResult>;
}
