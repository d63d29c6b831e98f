use serde::{Deserialize, Serialize};

use crate::domain::prompt::PromptTemplate;
use crate::domain::retrieval::RetrievalConfig;
use crate::domain::ChatModel;

/// A chat request: the query plus how to retrieve context for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    /// Retrieval steps to run; empty means answer without context
    #[serde(default)]
    pub retrieval_behaviour: Vec<RetrievalConfig>,
    #[serde(default)]
    pub model: ChatModel,
    /// Inline system template, takes precedence over a stored one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<PromptTemplate>,
    /// Id or name of a stored system template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template_name: Option<String>,
    /// Prior turns as (human, ai) pairs, oldest first
    #[serde(default)]
    pub history: Vec<(String, String)>,
}

impl ChatRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            retrieval_behaviour: Vec::new(),
            model: ChatModel::default(),
            prompt_template: None,
            prompt_template_name: None,
            history: Vec::new(),
        }
    }

    pub fn with_retrieval(mut self, config: RetrievalConfig) -> Self {
        self.retrieval_behaviour.push(config);
        self
    }

    pub fn with_model(mut self, model: ChatModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.prompt_template = Some(template);
        self
    }

    pub fn with_template_name(mut self, name: impl Into<String>) -> Self {
        self.prompt_template_name = Some(name.into());
        self
    }

    pub fn with_turn(mut self, human: impl Into<String>, ai: impl Into<String>) -> Self {
        self.history.push((human.into(), ai.into()));
        self
    }
}
