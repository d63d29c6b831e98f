//! Embedding vectors returned by a provider

use serde::{Deserialize, Serialize};

/// The vector for one input, tagged with the input's position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    index: usize,
    embedding: Vec<f32>,
}

impl Embedding {
    pub fn new(index: usize, embedding: Vec<f32>) -> Self {
        Self { index, embedding }
    }

    pub fn vector(&self) -> &[f32] {
        &self.embedding
    }

    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }
}

/// Vectors in input order, whatever order the backend returned them in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    model: String,
    data: Vec<Embedding>,
}

impl EmbeddingResponse {
    pub fn new(model: impl Into<String>, mut data: Vec<Embedding>) -> Self {
        data.sort_by_key(|e| e.index);
        Self {
            model: model.into(),
            data,
        }
    }

    pub fn embeddings(&self) -> &[Embedding] {
        &self.data
    }

    /// Vector of the first input; retrieval embeds one query at a time
    pub fn into_first_vector(self) -> Option<Vec<f32>> {
        self.data.into_iter().next().map(|e| e.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_vector_follows_input_order() {
        let response = EmbeddingResponse::new(
            "text-embedding-3-large",
            vec![Embedding::new(1, vec![1.0, 1.5]), Embedding::new(0, vec![0.0, 0.5])],
        );

        assert_eq!(response.embeddings()[1].dimensions(), 2);
        assert_eq!(response.into_first_vector(), Some(vec![0.0, 0.5]));
    }

    #[test]
    fn test_empty_response_has_no_vector() {
        let response = EmbeddingResponse::new("text-embedding-3-large", Vec::new());

        assert!(response.into_first_vector().is_none());
    }
}
