/*
[INPUT]:  Engine error bodies
[OUTPUT]: Typed error response struct
[POS]:    Data layer - type definitions for API communication
[UPDATE]: When the engine's error envelope changes
*/

use serde::{Deserialize, Serialize};

/// Structured error body returned with non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, alias = "Code")]
    pub code: String,
    #[serde(default, alias = "Message")]
    pub message: String,
    #[serde(default, alias = "Details")]
    pub details: String,
}

impl ErrorResponse {
    /// Best-effort parse; falls back to the raw body as the message.
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(parsed) if !parsed.code.is_empty() || !parsed.message.is_empty() => parsed,
            _ => ErrorResponse {
                message: body.trim().to_string(),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_body_structured() {
        let body = r#"{"Code":"BOUNDARY_ERROR","Message":"boundary error","Details":""}"#;
        let parsed = ErrorResponse::from_body(body);
        assert_eq!(parsed.code, "BOUNDARY_ERROR");
        assert_eq!(parsed.message, "boundary error");
    }

    #[test]
    fn test_from_body_plain_text() {
        let parsed = ErrorResponse::from_body("bad gateway\n");
        assert_eq!(parsed.code, "");
        assert_eq!(parsed.message, "bad gateway");
    }
}
