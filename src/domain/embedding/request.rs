//! Embedding request types

use serde::{Deserialize, Serialize};

use crate::domain::EmbeddingModel;

/// Request to generate embeddings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Model (and deployment) to embed with
    model: EmbeddingModel,
    /// Input text(s) to embed
    input: Vec<String>,
}

impl EmbeddingRequest {
    /// Create a request for a single text
    pub fn single(model: EmbeddingModel, text: impl Into<String>) -> Self {
        Self {
            model,
            input: vec![text.into()],
        }
    }

    /// Create a request for multiple texts
    pub fn batch(model: EmbeddingModel, texts: Vec<String>) -> Self {
        Self {
            model,
            input: texts,
        }
    }

    pub fn model(&self) -> EmbeddingModel {
        self.model
    }

    pub fn inputs(&self) -> &[String] {
        &self.input
    }
}
