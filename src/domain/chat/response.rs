use serde::{Deserialize, Serialize};

use crate::domain::llm::TokenUsage;
use crate::domain::retrieval::RetrievalStepResult;
use crate::domain::ChatModel;

/// Result of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_session_id: Option<String>,
    pub response: String,
    /// Flattened merged context
    pub documents: Vec<String>,
    /// The original query
    pub request: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_prompt: Option<String>,
    pub model: ChatModel,
    /// Generation time in milliseconds; retrieval is timed per step
    pub response_duration_ms: f64,
    pub token_usage: TokenUsage,
    /// Retrieval steps in configuration order
    pub steps: Vec<RetrievalStepResult>,
}

/// One item of a streamed chat run.
///
/// A successful stream is zero or more fragments followed by exactly one
/// final event; a failed stream ends with an error and no final event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Fragment { chunk: String },
    Final { metadata: Box<ChatResponse> },
}

impl StreamEvent {
    pub fn fragment(chunk: impl Into<String>) -> Self {
        Self::Fragment {
            chunk: chunk.into(),
        }
    }

    pub fn finished(response: ChatResponse) -> Self {
        Self::Final {
            metadata: Box::new(response),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Final { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_wire_format() {
        let json = serde_json::to_value(StreamEvent::fragment("Hel")).unwrap();
        assert_eq!(json, serde_json::json!({"type": "fragment", "chunk": "Hel"}));
    }

    #[test]
    fn test_final_wire_format() {
        let response = ChatResponse {
            chat_session_id: None,
            response: "Hello".to_string(),
            documents: vec![],
            request: "hi".to_string(),
            rendered_prompt: None,
            model: ChatModel::Gpt4o,
            response_duration_ms: 1.5,
            token_usage: TokenUsage::new(3, 1),
            steps: vec![],
        };

        let json = serde_json::to_value(StreamEvent::finished(response)).unwrap();
        assert_eq!(json["type"], "final");
        assert_eq!(json["metadata"]["response"], "Hello");
        assert_eq!(json["metadata"]["model"], "gpt-4o");
        assert_eq!(json["metadata"]["token_usage"]["total_tokens"], 4);
    }
}
