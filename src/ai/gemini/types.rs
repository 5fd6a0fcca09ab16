//! Gemini payload types shared by the invoker, handlers, and tests.

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::num::NonZeroU32;

/// Authorship of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One exchange unit in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }

    pub fn model(parts: Vec<Part>) -> Self {
        Self {
            role: Role::Model,
            parts,
        }
    }

    pub fn user_text(text: impl Into<String>) -> Self {
        Self::user(vec![Part::text(text)])
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self::model(vec![Part::text(text)])
    }
}

/// Untagged union of text and inline media content parts.
///
/// Variant order matters for `#[serde(untagged)]` decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// Inline binary part from raw bytes; encodes to base64.
    pub fn inline_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::inline_base64(
            mime_type,
            base64::engine::general_purpose::STANDARD.encode(bytes),
        )
    }

    /// Inline binary part from data that is already base64-encoded.
    pub fn inline_base64(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Part::InlineData {
            inline_data: InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            },
        }
    }
}

/// Base64 inline payload used for vision requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// Sampling parameters, passed to the model unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_output_tokens: 2048,
            top_p: 0.9,
        }
    }
}

/// Maximum number of request round-trips for one logical invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptBudget(NonZeroU32);

impl AttemptBudget {
    pub const SINGLE: AttemptBudget = AttemptBudget(NonZeroU32::MIN);

    /// Returns `None` for zero.
    pub fn new(attempts: u32) -> Option<Self> {
        NonZeroU32::new(attempts).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for AttemptBudget {
    fn default() -> Self {
        Self::SINGLE
    }
}

/// Why the upstream model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum FinishReason {
    Stop,
    MaxTokens,
    /// Any other upstream reason (`SAFETY`, `RECITATION`, ...), kept verbatim.
    Other(String),
    #[default]
    Unspecified,
}

impl FinishReason {
    pub fn as_str(&self) -> &str {
        match self {
            FinishReason::Stop => "STOP",
            FinishReason::MaxTokens => "MAX_TOKENS",
            FinishReason::Other(raw) => raw,
            FinishReason::Unspecified => "UNSPECIFIED",
        }
    }
}

impl From<String> for FinishReason {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::MaxTokens,
            "" | "FINISH_REASON_UNSPECIFIED" => FinishReason::Unspecified,
            _ => FinishReason::Other(raw),
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FinishReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Assembled output of one logical invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub text: String,
    pub finish_reason: FinishReason,
}

/// Top-level `generateContent` request body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest<'a> {
    pub contents: &'a [Turn],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct SystemInstruction {
    pub parts: Vec<Part>,
}

/// Top-level `generateContent` response body.
///
/// Kept as raw JSON; each field is pulled out on its own so a variant shape
/// in one place does not hide the rest of the candidate.
#[derive(Debug)]
pub(crate) struct GenerateContentResponse {
    body: Value,
}

impl GenerateContentResponse {
    /// A body that is not JSON at all decodes as empty.
    pub fn from_body(body: &str) -> Self {
        let body = serde_json::from_str(body).unwrap_or_else(|e| {
            tracing::warn!(
                "Vertex AI response is not JSON, treating as empty: {}\nBody: {}",
                e,
                body
            );
            Value::Null
        });
        Self { body }
    }

    /// First candidate's text parts joined in order, and its finish reason.
    pub fn into_chunk(self) -> (String, FinishReason) {
        let candidate = self
            .body
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|candidates| candidates.first());

        let text = candidate
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect::<String>()
            })
            .unwrap_or_default();

        let finish_reason = candidate
            .and_then(|c| c.get("finishReason"))
            .and_then(Value::as_str)
            .map(|reason| FinishReason::from(reason.to_string()))
            .unwrap_or_default();

        if candidate.is_none() && !self.body.is_null() {
            tracing::warn!("Vertex AI response has no candidates: {}", self.body);
        }

        (text, finish_reason)
    }
}
