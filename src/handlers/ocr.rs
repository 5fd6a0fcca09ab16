use super::{decode_image, CallContext, CallError, CallResult, ErrorCode};
use crate::ai::mime::detect_image_mime;
use crate::ai::{AttemptBudget, GenerationConfig, ModelInvoker, Part, Turn};
use crate::models::{ExtractTextRequest, ExtractTextResponse};
use crate::prompts;
use tracing::info;

const OCR_CONFIG: GenerationConfig = GenerationConfig {
    temperature: 0.0,
    max_output_tokens: 2048,
    top_p: 1.0,
};

/// OCR an inline image. Returns an empty string when nothing was read.
pub async fn extract_text(
    invoker: &dyn ModelInvoker,
    ctx: &CallContext,
    request: ExtractTextRequest,
) -> CallResult<ExtractTextResponse> {
    ctx.require_uid()?;

    let bytes = decode_image("base64Image", &request.base64_image)?;
    let mime_type = request
        .mime_type
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| detect_image_mime(&bytes).to_string());

    info!("Extracting text from {} image ({} bytes)", mime_type, bytes.len());

    let conversation = vec![Turn::user(vec![
        Part::text(prompts::OCR),
        Part::inline_base64(mime_type, request.base64_image.trim()),
    ])];

    let result = invoker
        .invoke(&conversation, None, OCR_CONFIG, AttemptBudget::SINGLE)
        .await?;

    Ok(ExtractTextResponse {
        text: result.text.trim().to_string(),
    })
}

/// Like [`extract_text`], but an empty transcription is a `not-found` error.
pub async fn extract_text_strict(
    invoker: &dyn ModelInvoker,
    ctx: &CallContext,
    request: ExtractTextRequest,
) -> CallResult<ExtractTextResponse> {
    let response = extract_text(invoker, ctx, request).await?;
    if response.text.is_empty() {
        return Err(CallError::new(
            ErrorCode::NotFound,
            "Could not extract any text from the image",
        ));
    }
    Ok(response)
}
