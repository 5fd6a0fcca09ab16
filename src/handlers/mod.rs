//! Caller-facing handlers
//!
//! Each handler authenticates the caller, validates input, talks to the
//! document store and the model, and returns a trimmed payload or a
//! classified [`CallError`].

pub mod chat;
pub mod error;
pub mod ocr;
pub mod questions;

pub use error::{CallError, ErrorCode};

use base64::Engine as _;

pub type CallResult<T> = std::result::Result<T, CallError>;

/// The authenticated caller, as established by the hosting platform.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    pub uid: Option<String>,
}

impl CallContext {
    pub fn authenticated(uid: impl Into<String>) -> Self {
        Self {
            uid: Some(uid.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn require_uid(&self) -> CallResult<&str> {
        self.uid
            .as_deref()
            .filter(|uid| !uid.is_empty())
            .ok_or_else(CallError::unauthenticated)
    }
}

/// Checks that `data` is non-empty base64 and returns the decoded bytes.
fn decode_image(field: &str, data: &str) -> CallResult<Vec<u8>> {
    if data.trim().is_empty() {
        return Err(CallError::invalid_argument(format!("{} is empty", field)));
    }
    base64::engine::general_purpose::STANDARD
        .decode(data.trim())
        .map_err(|e| CallError::invalid_argument(format!("{} is not valid base64: {}", field, e)))
}
