use serde::{Deserialize, Serialize};

use super::Message;

/// One chat completion call against a deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub stream: bool,
}

impl LlmRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            temperature: None,
            max_tokens: None,
            stream: false,
        }
    }

    /// Same messages, answered as a stream of fragments
    pub fn streaming(messages: Vec<Message>) -> Self {
        Self {
            stream: true,
            ..Self::new(messages)
        }
    }

    /// A deterministic call, as used for query transformations
    pub fn deterministic(messages: Vec<Message>) -> Self {
        Self::new(messages).with_temperature(0.0)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Concatenated message contents, the text the prompt is billed on
    pub fn prompt_text(&self) -> String {
        Message::concat(&self.messages)
    }
}
