//! Search results and per-step retrieval records

use serde::{Deserialize, Serialize};

use super::{RetrievalConfig, RetrieverKind};

/// A single search result.
///
/// The score is backend-native and not comparable across retriever kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    pub summary: String,
    pub content: String,
    pub score: f64,
    #[serde(rename = "type")]
    pub kind: RetrieverKind,
}

impl SearchResult {
    pub fn new(
        name: impl Into<String>,
        summary: impl Into<String>,
        content: impl Into<String>,
        score: f64,
        kind: RetrieverKind,
    ) -> Self {
        Self {
            name: name.into(),
            summary: summary.into(),
            content: content.into(),
            score,
            kind,
        }
    }
}

/// Record of one executed retrieval step, durations in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalStepResult {
    pub config: RetrievalConfig,
    pub initial_query: String,
    #[serde(rename = "pre_retrieval")]
    pub pre_retrieval_query: String,
    pub pre_retrieval_duration_ms: f64,
    #[serde(rename = "retrieval")]
    pub retrieved: Vec<SearchResult>,
    pub retrieval_duration_ms: f64,
    #[serde(rename = "post_retrieval")]
    pub post_retrieved: Vec<SearchResult>,
    pub post_retrieval_duration_ms: f64,
}

impl RetrievalStepResult {
    /// Context key the step contributes to
    pub fn context_key(&self) -> &str {
        self.config.context_key()
    }

    /// Content of each post-retrieval document, in order
    pub fn contributions(&self) -> Vec<String> {
        self.post_retrieved.iter().map(|d| d.content.clone()).collect()
    }
}
