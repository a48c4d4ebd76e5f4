use serde_json::Value;

use crate::error::ReadexError;

/// Request validation utilities
pub struct RequestValidator;

impl RequestValidator {
    /// Extracts the markdown body from a raw share request.
    ///
    /// The body must be a JSON object whose `content` is a non-empty string.
    pub fn share_content(body: &[u8]) -> Result<String, ReadexError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|_| ReadexError::Validation("Invalid JSON body".to_string()))?;

        Self::content_field(&value)
    }

    pub fn content_field(body: &Value) -> Result<String, ReadexError> {
        match body.get("content") {
            Some(Value::String(content)) if !content.is_empty() => Ok(content.clone()),
            _ => Err(ReadexError::Validation("Invalid content".to_string())),
        }
    }
}
