//! Pulls a JSON array out of free-form model output.
//!
//! Models often wrap the requested array in prose or markdown code fences.
//! We take the first balanced `[...]` span (brackets inside string literals
//! do not count) and deserialize only that.

use crate::{Error, Result};
use serde::de::DeserializeOwned;

/// The first balanced top-level `[...]` span in `text`.
fn first_balanced_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

pub fn extract_json_array<T: DeserializeOwned>(text: &str) -> Result<Vec<T>> {
    let slice = first_balanced_array(text).ok_or_else(|| {
        Error::MalformedGenerationOutput("No complete JSON array in model output".to_string())
    })?;

    serde_json::from_str(slice).map_err(|e| {
        tracing::error!("Failed to parse JSON array from model output: {}\n{}", e, text);
        Error::MalformedGenerationOutput(format!("Invalid JSON array: {}", e))
    })
}
