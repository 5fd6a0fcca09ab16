use gemini_functions::{
    ai::{
        AttemptBudget, FinishReason, GeminiInvoker, GenerationConfig, InvocationResult,
        ModelInvoker, StaticTokenProvider, Turn, VertexEndpoint, VertexHttpClient,
    },
    app::{App, AppServices},
    handlers::{CallContext, ErrorCode},
    models::{ChatRequest, ExtractTextRequest, GenerateQuestionsRequest},
    store::{DocumentStore, MemoryStore},
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MODEL_PATH: &str =
    "/v1/projects/test-project/locations/us-central1/publishers/google/models/gemini-2.0-flash:generateContent";

fn candidate(text: &str, finish_reason: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": finish_reason
        }],
        "usageMetadata": { "promptTokenCount": 3, "candidatesTokenCount": 1 }
    }))
}

fn invoker(server: &MockServer) -> GeminiInvoker {
    let http = VertexHttpClient::new(
        VertexEndpoint::new(
            "test-project".to_string(),
            "us-central1".to_string(),
            "gemini-2.0-flash".to_string(),
        ),
        Duration::from_secs(5),
    )
    .with_base_url(server.uri());

    GeminiInvoker::new(
        http,
        Arc::new(StaticTokenProvider::new("integration-token".to_string())),
    )
}

fn app(server: &MockServer, store: &MemoryStore) -> App {
    App::with_services(AppServices {
        invoker: Box::new(invoker(server)),
        store: Box::new(store.clone()),
    })
}

async fn bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_single_request_hello() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .and(header("authorization", "Bearer integration-token"))
        .respond_with(candidate("hi", "STOP"))
        .expect(1)
        .mount(&server)
        .await;

    let result = invoker(&server)
        .invoke(
            &[Turn::user_text("hello")],
            None,
            GenerationConfig::default(),
            AttemptBudget::new(1).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        result,
        InvocationResult {
            text: "hi".to_string(),
            finish_reason: FinishReason::Stop,
        }
    );
    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        json!({ "text": "hi", "finishReason": "STOP" })
    );
}

#[tokio::test]
async fn test_truncated_answer_is_assembled() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(candidate("ab", "MAX_TOKENS"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(candidate("cd", "STOP"))
        .mount(&server)
        .await;

    let result = invoker(&server)
        .invoke(
            &[Turn::user_text("hello")],
            None,
            GenerationConfig::default(),
            AttemptBudget::new(2).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(result.text, "abcd");
    assert_eq!(result.finish_reason, FinishReason::Stop);
    assert_eq!(bodies(&server).await.len(), 2);
}

#[tokio::test]
async fn test_ocr_through_app() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(candidate("  Chapter 1\nIntroduction.  ", "STOP"))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let response = app(&server, &store)
        .extract_text(
            &CallContext::authenticated("u1"),
            ExtractTextRequest {
                base64_image: "iVBORw0KGgo=".to_string(),
                mime_type: None,
            },
            true,
        )
        .await
        .unwrap();

    assert_eq!(response.text, "Chapter 1\nIntroduction.");

    let sent = &bodies(&server).await[0];
    assert_eq!(
        sent["contents"][0]["parts"][1],
        json!({ "inlineData": { "mimeType": "image/png", "data": "iVBORw0KGgo=" } })
    );
    assert_eq!(
        sent["generationConfig"],
        json!({ "temperature": 0.0, "maxOutputTokens": 2048, "topP": 1.0 })
    );
    assert!(sent.get("systemInstruction").is_none());
}

#[tokio::test]
async fn test_questions_through_app() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(candidate(
            "```json\n[{\"questionText\":\"Q\",\"correctChoiceText\":\"A\",\
             \"incorrectChoice1Text\":\"B\",\"incorrectChoice2Text\":\"C\",\
             \"incorrectChoice3Text\":\"D\",\"explanationText\":\"E\"}]\n```",
            "STOP",
        ))
        .mount(&server)
        .await;

    let store = MemoryStore::new().with_document("questionSets/qs1", json!({ "questionCount": 0 }));
    let response = app(&server, &store)
        .generate_questions(
            &CallContext::authenticated("u1"),
            GenerateQuestionsRequest {
                base64_image: "/9j/4AAQ".to_string(),
                question_set_id: "qs1".to_string(),
                question_type: Some("single_choice".to_string()),
                generate_count: Some(3),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(response.question_ids.len(), 1);
    let question = store
        .get(&format!("questions/{}", response.question_ids[0]))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(question.str_field("incorrectChoice3Text"), Some("D"));

    let set = store.get("questionSets/qs1").await.unwrap().unwrap();
    assert_eq!(set.data["questionCount"], json!(1));

    let sent = &bodies(&server).await[0];
    assert_eq!(sent["generationConfig"]["maxOutputTokens"], json!(4096));
}

#[tokio::test]
async fn test_rate_limited_chat_is_resource_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MODEL_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "status": "RESOURCE_EXHAUSTED" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = MemoryStore::new();
    let err = app(&server, &store)
        .chat_reply(
            &CallContext::authenticated("u1"),
            ChatRequest {
                message: "hello".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::ResourceExhausted);
    assert!(err.message.contains("RESOURCE_EXHAUSTED"));
}
