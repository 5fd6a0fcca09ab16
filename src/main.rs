use anyhow::{Context, Result};
use base64::Engine as _;
use clap::{Parser, Subcommand};
use gemini_functions::ai::{AttemptBudget, FinishReason, GenerationConfig, ModelInvoker, Turn};
use gemini_functions::app::App;
use gemini_functions::handlers::CallContext;
use gemini_functions::models::{Config, ExtractTextRequest, GenerateQuestionsRequest};
use gemini_functions::store::{DocumentStore, MemoryStore};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "gemini-functions")]
#[command(about = "Run the Gemini handlers locally against Vertex AI")]
struct CliArgs {
    /// Caller uid recorded on stored documents.
    #[arg(long, global = true, default_value = "local-cli")]
    uid: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send a single prompt, continuing truncated answers.
    Ask {
        message: String,
        #[arg(long)]
        system: Option<String>,
        #[arg(long, default_value_t = 3)]
        max_attempts: u32,
        #[arg(long, default_value_t = 0.7)]
        temperature: f32,
        #[arg(long, default_value_t = 1024)]
        max_tokens: u32,
        #[arg(long, default_value_t = 0.9)]
        top_p: f32,
    },
    /// Transcribe the text in an image.
    Ocr {
        image: PathBuf,
        #[arg(long)]
        mime_type: Option<String>,
        /// Fail when no text is found.
        #[arg(long)]
        strict: bool,
    },
    /// Generate study questions from an image and print them.
    Questions {
        image: PathBuf,
        #[arg(long, default_value = "local-set")]
        question_set: String,
        #[arg(long, value_name = "TYPE")]
        question_type: Option<String>,
        #[arg(long, default_value_t = 1)]
        count: i64,
    },
}

async fn read_image_base64(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

async fn run(args: CliArgs) -> Result<()> {
    let config = Config::from_env()?;
    let store = MemoryStore::new();
    let app = App::from_config(&config, Box::new(store.clone()));
    let ctx = CallContext::authenticated(args.uid);

    match args.command {
        Command::Ask {
            message,
            system,
            max_attempts,
            temperature,
            max_tokens,
            top_p,
        } => {
            let budget =
                AttemptBudget::new(max_attempts).context("--max-attempts must be at least 1")?;
            let generation = GenerationConfig {
                temperature,
                max_output_tokens: max_tokens,
                top_p,
            };
            let result = app
                .invoker()
                .invoke(
                    &[Turn::user_text(message)],
                    system.as_deref(),
                    generation,
                    budget,
                )
                .await?;

            if result.finish_reason == FinishReason::MaxTokens {
                warn!("Answer may be incomplete: attempt budget exhausted at MAX_TOKENS");
            }
            info!("Finish reason: {}", result.finish_reason);
            println!("{}", result.text);
        }
        Command::Ocr {
            image,
            mime_type,
            strict,
        } => {
            let request = ExtractTextRequest {
                base64_image: read_image_base64(&image).await?,
                mime_type,
            };
            let response = app.extract_text(&ctx, request, strict).await?;
            println!("{}", response.text);
        }
        Command::Questions {
            image,
            question_set,
            question_type,
            count,
        } => {
            let store = store.with_document(
                &format!("questionSets/{}", question_set),
                json!({ "questionCount": 0 }),
            );
            let request = GenerateQuestionsRequest {
                base64_image: read_image_base64(&image).await?,
                question_set_id: question_set,
                question_type,
                generate_count: Some(count),
                ..Default::default()
            };
            let response = app.generate_questions(&ctx, request).await?;

            let mut generated = Vec::new();
            for id in &response.question_ids {
                if let Some(doc) = store.get(&format!("questions/{}", id)).await? {
                    generated.push(serde_json::Value::Object(doc.data));
                }
            }
            println!("{}", serde_json::to_string_pretty(&generated)?);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gemini_functions=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Command failed: {:#}", e);
            std::process::exit(1);
        }
    }
}
