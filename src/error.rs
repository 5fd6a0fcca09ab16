//! Error handling and custom error types
//!
//! Provides unified error handling across the crate using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Environment file error: {0}")]
    EnvVar(#[from] dotenvy::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential acquisition failed. Never retried.
    #[error("Upstream auth error: {0}")]
    UpstreamAuth(String),

    /// Transport failure, timeout, or non-success status from the model endpoint.
    #[error("Upstream request error (status {}): {message}", fmt_status(.status))]
    UpstreamRequest { status: Option<u16>, message: String },

    #[error("Malformed generation output: {0}")]
    MalformedGenerationOutput(String),

    #[error("Document store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    pub(crate) fn upstream_transport(err: reqwest::Error) -> Self {
        Error::UpstreamRequest {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map_or_else(|| "none".to_string(), |s| s.to_string())
}

pub type Result<T> = std::result::Result<T, Error>;
