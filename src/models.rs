//! Data models and structures
//!
//! Caller-facing request/response payloads for the handlers, the question
//! records parsed from model output, and environment configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub memo_id: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub question_id: Option<String>,
    #[serde(default)]
    pub system_context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub reply: String,
    pub memo_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractTextRequest {
    #[serde(default)]
    pub base64_image: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractTextResponse {
    pub text: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    TrueFalse,
    #[default]
    SingleChoice,
    FlashCard,
}

impl QuestionType {
    /// Unknown or missing names fall back to single choice.
    pub fn parse_or_default(name: Option<&str>) -> Self {
        match name {
            Some("true_false") => QuestionType::TrueFalse,
            Some("flash_card") => QuestionType::FlashCard,
            _ => QuestionType::SingleChoice,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionType::TrueFalse => "true_false",
            QuestionType::SingleChoice => "single_choice",
            QuestionType::FlashCard => "flash_card",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsRequest {
    #[serde(default)]
    pub base64_image: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub question_set_id: String,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub generate_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsResponse {
    pub question_ids: Vec<String>,
}

/// One question as the model writes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub question_text: String,
    #[serde(default)]
    pub correct_choice_text: Option<String>,
    #[serde(default)]
    pub incorrect_choice1_text: Option<String>,
    #[serde(default)]
    pub incorrect_choice2_text: Option<String>,
    #[serde(default)]
    pub incorrect_choice3_text: Option<String>,
    #[serde(default)]
    pub explanation_text: Option<String>,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub project: String,
    pub location: String,
    pub model: String,
    /// When unset, tokens come from the metadata server.
    pub access_token: Option<String>,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        load_env_file(dotenvy::dotenv())?;

        let project = std::env::var("GOOGLE_CLOUD_PROJECT")
            .or_else(|_| std::env::var("GCLOUD_PROJECT"))
            .map_err(|_| {
                crate::Error::Config("GOOGLE_CLOUD_PROJECT (or GCLOUD_PROJECT) not set".to_string())
            })?;

        let request_timeout = match std::env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                crate::Error::Config(format!("Invalid REQUEST_TIMEOUT_SECS: {}", raw))
            })?),
            Err(_) => Duration::from_secs(60),
        };

        Ok(Self {
            project,
            location: std::env::var("VERTEX_LOCATION")
                .unwrap_or_else(|_| "us-central1".to_string()),
            model: std::env::var("VERTEX_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),
            access_token: std::env::var("VERTEX_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),
            request_timeout,
        })
    }
}

/// A missing `.env` is fine; one that exists but cannot be read or parsed is not.
fn load_env_file<T>(loaded: dotenvy::Result<T>) -> crate::Result<()> {
    match loaded {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_accepts_camel_case_and_missing_fields() {
        let request: ChatRequest = serde_json::from_value(serde_json::json!({
            "memoId": "m1",
            "message": "hello"
        }))
        .unwrap();

        assert_eq!(request.memo_id.as_deref(), Some("m1"));
        assert_eq!(request.message, "hello");
        assert!(request.question_id.is_none());
        assert!(request.system_context.is_none());
    }

    #[test]
    fn test_question_type_fallback() {
        assert_eq!(
            QuestionType::parse_or_default(Some("true_false")),
            QuestionType::TrueFalse
        );
        assert_eq!(
            QuestionType::parse_or_default(Some("essay")),
            QuestionType::SingleChoice
        );
        assert_eq!(QuestionType::parse_or_default(None), QuestionType::SingleChoice);
    }

    #[test]
    fn test_generated_question_tolerates_missing_optionals() {
        let q: GeneratedQuestion = serde_json::from_value(serde_json::json!({
            "questionText": "Is water wet?",
            "correctChoiceText": "正しい",
            "incorrectChoice1Text": "間違い"
        }))
        .unwrap();

        assert_eq!(q.question_text, "Is water wet?");
        assert_eq!(q.incorrect_choice1_text.as_deref(), Some("間違い"));
        assert!(q.explanation_text.is_none());
    }

    #[test]
    fn test_generate_questions_response_is_camel_case() {
        let json = serde_json::to_value(GenerateQuestionsResponse {
            question_ids: vec!["a".to_string()],
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "questionIds": ["a"] }));
    }

    #[test]
    fn test_env_file_absent_is_ignored() {
        let missing = std::env::temp_dir().join(format!("absent-{}.env", uuid::Uuid::new_v4()));
        assert!(load_env_file(dotenvy::from_path(&missing)).is_ok());
    }

    #[test]
    fn test_env_file_parse_error_is_reported() {
        let path = std::env::temp_dir().join(format!("broken-{}.env", uuid::Uuid::new_v4()));
        std::fs::write(&path, "VERTEX_MODEL=\"unterminated\n").unwrap();

        let result = load_env_file(dotenvy::from_path(&path));
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(crate::Error::EnvVar(_))));
    }
}
