//! Caller-facing error classification.

use crate::Error;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error as ThisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Unauthenticated,
    InvalidArgument,
    ResourceExhausted,
    NotFound,
    DataLoss,
    Internal,
}

impl ErrorCode {
    /// Wire name, used for both `Display` and serialization.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unauthenticated => "unauthenticated",
            ErrorCode::InvalidArgument => "invalid-argument",
            ErrorCode::ResourceExhausted => "resource-exhausted",
            ErrorCode::NotFound => "not-found",
            ErrorCode::DataLoss => "data-loss",
            ErrorCode::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ThisError)]
#[error("{code}: {message}")]
pub struct CallError {
    pub code: ErrorCode,
    pub message: String,
}

impl CallError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unauthenticated() -> Self {
        Self::new(ErrorCode::Unauthenticated, "Sign-in is required")
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }
}

impl From<Error> for CallError {
    fn from(err: Error) -> Self {
        match err {
            Error::UpstreamRequest {
                status: Some(429),
                message,
            } => CallError::new(
                ErrorCode::ResourceExhausted,
                format!("Model quota exhausted: {}", message),
            ),
            Error::UpstreamRequest { message, .. } => CallError::new(
                ErrorCode::Internal,
                format!("Gemini response error: {}", message),
            ),
            Error::MalformedGenerationOutput(message) => CallError::new(
                ErrorCode::DataLoss,
                format!("No valid JSON array from Gemini: {}", message),
            ),
            Error::NotFound(message) => CallError::new(ErrorCode::NotFound, message),
            other => CallError::new(ErrorCode::Internal, format!("Unknown exception: {}", other)),
        }
    }
}
