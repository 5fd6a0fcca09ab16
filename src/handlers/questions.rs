use super::{decode_image, CallContext, CallError, CallResult};
use crate::ai::mime::detect_image_mime;
use crate::ai::{AttemptBudget, GenerationConfig, ModelInvoker, Part, Turn};
use crate::json_extract::extract_json_array;
use crate::models::{
    GenerateQuestionsRequest, GenerateQuestionsResponse, GeneratedQuestion, QuestionType,
};
use crate::prompts;
use crate::store::{timestamp_now, to_fields, DocumentStore, Fields, Write};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

pub const MAX_GENERATE_COUNT: i64 = 10;

const QUESTION_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 0.3,
    max_output_tokens: 4096,
    top_p: 0.9,
};

/// Missing, zero, or negative counts become 1; large ones are capped.
pub fn clamp_generate_count(requested: Option<i64>) -> usize {
    requested.unwrap_or(1).clamp(1, MAX_GENERATE_COUNT) as usize
}

fn prompt_for(question_type: QuestionType, count: usize) -> String {
    let template = match question_type {
        QuestionType::TrueFalse => prompts::QUESTIONS_TRUE_FALSE,
        QuestionType::SingleChoice => prompts::QUESTIONS_SINGLE_CHOICE,
        QuestionType::FlashCard => prompts::QUESTIONS_FLASH_CARD,
    };
    prompts::render(template, &[("count", &count.to_string())])
}

fn question_fields(
    question: &GeneratedQuestion,
    question_type: QuestionType,
    question_set_id: &str,
    uid: &str,
    now: &Value,
) -> Fields {
    let mut fields = to_fields(json!({
        "questionSetId": question_set_id,
        "questionSetPath": format!("questionSets/{}", question_set_id),
        "questionText": question.question_text,
        "questionType": question_type.as_str(),
        "explanationText": question.explanation_text.clone().unwrap_or_default(),
        "memoCount": 0,
        "isOfficialQuestion": false,
        "isDeleted": false,
        "createdById": uid,
        "updatedById": uid,
        "createdByPath": format!("users/{}", uid),
        "updatedByPath": format!("users/{}", uid),
        "createdAt": now,
        "updatedAt": now,
    }));

    let choices: Vec<(&str, &Option<String>)> = match question_type {
        QuestionType::TrueFalse => vec![
            ("correctChoiceText", &question.correct_choice_text),
            ("incorrectChoice1Text", &question.incorrect_choice1_text),
        ],
        QuestionType::SingleChoice => vec![
            ("correctChoiceText", &question.correct_choice_text),
            ("incorrectChoice1Text", &question.incorrect_choice1_text),
            ("incorrectChoice2Text", &question.incorrect_choice2_text),
            ("incorrectChoice3Text", &question.incorrect_choice3_text),
        ],
        QuestionType::FlashCard => vec![("correctChoiceText", &question.correct_choice_text)],
    };
    for (name, value) in choices {
        fields.insert(name.to_string(), json!(value));
    }

    fields
}

/// Generate study questions from an image and store them in a question set.
pub async fn generate_from_image(
    invoker: &dyn ModelInvoker,
    store: &dyn DocumentStore,
    ctx: &CallContext,
    request: GenerateQuestionsRequest,
) -> CallResult<GenerateQuestionsResponse> {
    let uid = ctx.require_uid()?;

    let count = clamp_generate_count(request.generate_count);
    let question_type = QuestionType::parse_or_default(request.question_type.as_deref());
    info!(
        "Generating {} {} question(s) from image",
        count,
        question_type.as_str()
    );

    let bytes = decode_image("base64Image", &request.base64_image)?;
    if request.question_set_id.trim().is_empty() {
        return Err(CallError::invalid_argument("questionSetId is required"));
    }
    let mime_type = request
        .mime_type
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| detect_image_mime(&bytes).to_string());

    let conversation = vec![Turn::user(vec![
        Part::text(prompt_for(question_type, count)),
        Part::inline_base64(mime_type, request.base64_image.trim()),
    ])];

    let result = invoker
        .invoke(&conversation, None, QUESTION_CONFIG, AttemptBudget::SINGLE)
        .await?;

    let questions: Vec<GeneratedQuestion> = extract_json_array(&result.text)?;

    let now = timestamp_now();
    let mut ids = Vec::with_capacity(count);
    let mut writes = Vec::with_capacity(count + 2);

    for question in questions.iter().take(count) {
        let id = Uuid::new_v4().to_string();
        writes.push(Write::Set {
            path: format!("questions/{}", id),
            data: question_fields(question, question_type, &request.question_set_id, uid, &now),
        });
        ids.push(id);
    }

    let set_path = format!("questionSets/{}", request.question_set_id);
    writes.push(Write::Increment {
        path: set_path.clone(),
        field: "questionCount".to_string(),
        by: ids.len() as i64,
    });
    writes.push(Write::Update {
        path: set_path,
        fields: to_fields(json!({ "updatedAt": now, "updatedById": uid })),
    });

    if let Some(folder_id) = request.folder_id.filter(|id| !id.is_empty()) {
        let folder_path = format!("folders/{}", folder_id);
        writes.push(Write::Increment {
            path: folder_path.clone(),
            field: "questionCount".to_string(),
            by: ids.len() as i64,
        });
        writes.push(Write::Update {
            path: folder_path,
            fields: to_fields(json!({ "updatedAt": now, "updatedById": uid })),
        });
    }

    store.commit(writes).await?;
    info!("Saved {} question(s): {:?}", ids.len(), ids);

    Ok(GenerateQuestionsResponse { question_ids: ids })
}
