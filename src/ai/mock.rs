use super::{AttemptBudget, FinishReason, GenerationConfig, InvocationResult, ModelInvoker, Turn};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum ScriptedReply {
    Text(InvocationResult),
    RequestError { status: Option<u16>, message: String },
    AuthError(String),
}

/// Arguments captured from one `invoke` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedInvocation {
    pub conversation: Vec<Turn>,
    pub system_instruction: Option<String>,
    pub config: GenerationConfig,
    pub budget: AttemptBudget,
}

#[derive(Clone)]
pub struct MockModelInvoker {
    replies: Arc<Mutex<Vec<ScriptedReply>>>,
    calls: Arc<Mutex<Vec<RecordedInvocation>>>,
}

impl MockModelInvoker {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_text(self, text: &str) -> Self {
        self.with_result(InvocationResult {
            text: text.to_string(),
            finish_reason: FinishReason::Stop,
        })
    }

    pub fn with_result(self, result: InvocationResult) -> Self {
        self.replies.lock().unwrap().push(ScriptedReply::Text(result));
        self
    }

    pub fn with_request_error(self, status: Option<u16>, message: &str) -> Self {
        self.replies.lock().unwrap().push(ScriptedReply::RequestError {
            status,
            message: message.to_string(),
        });
        self
    }

    pub fn with_auth_error(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push(ScriptedReply::AuthError(message.to_string()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn get_calls(&self) -> Vec<RecordedInvocation> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockModelInvoker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelInvoker for MockModelInvoker {
    async fn invoke(
        &self,
        conversation: &[Turn],
        system_instruction: Option<&str>,
        config: GenerationConfig,
        budget: AttemptBudget,
    ) -> Result<InvocationResult> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(RecordedInvocation {
            conversation: conversation.to_vec(),
            system_instruction: system_instruction.map(|s| s.to_string()),
            config,
            budget,
        });

        let replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Ok(InvocationResult {
                text: "mock response".to_string(),
                finish_reason: FinishReason::Stop,
            });
        }

        // Cycles through scripted replies
        let index = (calls.len() - 1) % replies.len();
        match replies[index].clone() {
            ScriptedReply::Text(result) => Ok(result),
            ScriptedReply::RequestError { status, message } => {
                Err(Error::UpstreamRequest { status, message })
            }
            ScriptedReply::AuthError(message) => Err(Error::UpstreamAuth(message)),
        }
    }
}
