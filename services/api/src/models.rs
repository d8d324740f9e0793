//! API Models
//!
//! Request and error bodies of the HTTP API, documented with `utoipa`.
//! The response documents themselves live in `learnpath_core::course`.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema, Debug)]
pub struct LearningRequest {
    /// What the learner wants to study. At least 5 characters.
    #[schema(example = "I want to learn about Black Holes", min_length = 5)]
    pub topic: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Documents one line of the NDJSON stream: a module, or a terminal error.
#[derive(Serialize, ToSchema)]
pub struct StreamErrorChunk {
    #[schema(example = "Failed to generate modules: generator returned empty content")]
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learning_request_deserialization() {
        let json = r#"{"topic": "I want to learn about Black Holes"}"#;
        let payload: LearningRequest = serde_json::from_str(json).unwrap();

        assert_eq!(payload.topic, "I want to learn about Black Holes");
    }

    #[test]
    fn test_learning_request_missing_field() {
        let result: Result<LearningRequest, _> = serde_json::from_str("{}");
        assert!(result.is_err());
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            detail: "Failed to generate modules: boom".to_string(),
        };

        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"detail":"Failed to generate modules: boom"}"#);
    }
}
