use super::{CallContext, CallError, CallResult, ErrorCode};
use crate::ai::{AttemptBudget, GenerationConfig, ModelInvoker, Turn};
use crate::models::{ChatRequest, ChatResponse};
use crate::store::{timestamp_now, to_fields, DocumentStore, Write};
use crate::Result;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Author id recorded on model-written replies.
pub const MODEL_AUTHOR_ID: &str = "gemini";

const HISTORY_LIMIT: usize = 10;

/// Answer a memo message, persisting both sides of the exchange.
///
/// Without `memo_id` a new private memo is created from the message; with one
/// the message is appended as a reply and the memo's recent replies become the
/// conversation history.
pub async fn reply(
    invoker: &dyn ModelInvoker,
    store: &dyn DocumentStore,
    ctx: &CallContext,
    request: ChatRequest,
) -> CallResult<ChatResponse> {
    let uid = ctx.require_uid()?;
    if request.message.trim().is_empty() {
        return Err(CallError::invalid_argument("message is empty"));
    }

    let question_id = request.question_id.unwrap_or_default();
    let memo_id = request.memo_id.filter(|id| !id.is_empty());

    // History is read before the new message is stored so it is sent once.
    let (memo_id, history) = match memo_id {
        Some(memo_id) => {
            if store.get(&format!("memos/{}", memo_id)).await?.is_none() {
                return Err(CallError::new(
                    ErrorCode::NotFound,
                    format!("Memo {} does not exist", memo_id),
                ));
            }
            let history = load_history(store, &memo_id, uid).await?;
            add_reply(store, &memo_id, &request.message, uid, false).await?;
            (memo_id, history)
        }
        None => {
            let license_name = if question_id.is_empty() {
                String::new()
            } else {
                resolve_license_name(store, &question_id)
                    .await
                    .unwrap_or_else(|e| {
                        warn!("License name lookup failed for question {}: {}", question_id, e);
                        String::new()
                    })
            };
            let memo_id =
                create_memo(store, &question_id, &license_name, &request.message, uid).await?;
            (memo_id, Vec::new())
        }
    };

    let mut conversation = history;
    conversation.push(Turn::user_text(request.message));

    info!(
        "Requesting reply for memo {} ({} turns)",
        memo_id,
        conversation.len()
    );

    let result = invoker
        .invoke(
            &conversation,
            request.system_context.as_deref(),
            GenerationConfig::default(),
            AttemptBudget::SINGLE,
        )
        .await?;

    add_reply(store, &memo_id, &result.text, MODEL_AUTHOR_ID, true).await?;

    Ok(ChatResponse {
        reply: result.text,
        memo_id,
    })
}

/// Follows question -> question set -> folder to the folder's license name.
async fn resolve_license_name(store: &dyn DocumentStore, question_id: &str) -> Result<String> {
    let Some(question) = store.get(&format!("questions/{}", question_id)).await? else {
        return Ok(String::new());
    };
    let Some(set_id) = question.str_field("questionSetId").filter(|id| !id.is_empty()) else {
        return Ok(String::new());
    };
    let Some(question_set) = store.get(&format!("questionSets/{}", set_id)).await? else {
        return Ok(String::new());
    };
    let Some(folder_id) = question_set.str_field("folderId").filter(|id| !id.is_empty()) else {
        return Ok(String::new());
    };
    let folder = store.get(&format!("folders/{}", folder_id)).await?;

    Ok(folder
        .and_then(|f| f.str_field("licenseName").map(str::to_string))
        .unwrap_or_default())
}

async fn load_history(store: &dyn DocumentStore, memo_id: &str, uid: &str) -> Result<Vec<Turn>> {
    let replies = store
        .query_last(
            &format!("memos/{}/replies", memo_id),
            "createdAt",
            HISTORY_LIMIT,
        )
        .await?;

    Ok(replies
        .iter()
        .map(|reply| {
            let content = reply.str_field("content").unwrap_or_default();
            if reply.str_field("createdById") == Some(uid) {
                Turn::user_text(content)
            } else {
                Turn::model_text(content)
            }
        })
        .collect())
}

async fn create_memo(
    store: &dyn DocumentStore,
    question_id: &str,
    license_name: &str,
    message: &str,
    uid: &str,
) -> Result<String> {
    let now = timestamp_now();
    store
        .add(
            "memos",
            to_fields(json!({
                "questionId": question_id,
                "visibility": "private",
                "isDeleted": false,
                "licenseName": license_name,
                "content": message,
                "memoType": "question",
                "createdById": uid,
                "createdAt": now,
                "title": "",
                "contentFormat": "plain_text",
                "attachedImages": [],
                "likeCount": 0,
                "replyCount": 0,
                "isResolved": false,
                "isAIGenerated": false,
                "updatedById": uid,
                "updatedAt": now,
                "deletedAt": Value::Null,
            })),
        )
        .await
}

async fn add_reply(
    store: &dyn DocumentStore,
    memo_id: &str,
    content: &str,
    author_id: &str,
    is_ai_generated: bool,
) -> Result<()> {
    let now = timestamp_now();
    let memo_path = format!("memos/{}", memo_id);

    store
        .add(
            &format!("{}/replies", memo_path),
            to_fields(json!({
                "content": content,
                "parentReplyId": Value::Null,
                "createdById": author_id,
                "createdAt": now,
                "isAIGenerated": is_ai_generated,
                "isDeleted": false,
            })),
        )
        .await?;

    store
        .commit(vec![
            Write::Increment {
                path: memo_path.clone(),
                field: "replyCount".to_string(),
                by: 1,
            },
            Write::Update {
                path: memo_path,
                fields: to_fields(json!({ "updatedById": author_id, "updatedAt": now })),
            },
        ])
        .await
}
