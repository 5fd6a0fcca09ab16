//! Request handlers for a study app backed by Gemini on Vertex AI
//!
//! Handlers authenticate the caller, validate input, read and write memo and
//! question records, and forward content to the model through a
//! continuation-aware invoker.

pub mod ai;
pub mod app;
pub mod error;
pub mod handlers;
pub mod json_extract;
pub mod models;
pub mod prompts;
pub mod store;

pub use error::{Error, Result};
