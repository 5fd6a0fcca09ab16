pub mod client;
pub mod invoker;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{VertexEndpoint, VertexHttpClient};
pub use invoker::GeminiInvoker;
pub use types::{
    AttemptBudget, FinishReason, GenerationConfig, InlineData, InvocationResult, Part, Role, Turn,
};
