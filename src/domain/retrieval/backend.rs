//! Search backends consumed by the retrieval strategies

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::DomainError;

/// Field of the index holding document vectors
pub const VECTOR_FIELD: &str = "embedding";

/// Score attribute attached to every vector search hit
pub const SEARCH_SCORE_FIELD: &str = "@search.score";

/// A nearest-neighbour query against a vector index
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSearchRequest {
    pub index: String,
    pub vector: Vec<f32>,
    pub select: Vec<String>,
    pub top_k: u32,
    pub field: &'static str,
}

/// A raw row returned by a vector index
pub type SearchRow = Map<String, Value>;

/// Vector index backend
#[async_trait]
pub trait VectorSearchBackend: Send + Sync + Debug {
    async fn vector_search(&self, request: &VectorSearchRequest)
    -> Result<Vec<SearchRow>, DomainError>;
}

/// A row of the graph traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphRow {
    pub name: String,
    pub summary: String,
    pub related_name: String,
    pub score: f64,
}

/// Graph database backend.
///
/// The client is blocking only; async callers must offload it.
pub trait GraphSearchBackend: Send + Sync + Debug {
    fn graph_search(
        &self,
        vector: &[f32],
        threshold: f64,
        top_k: u32,
    ) -> Result<Vec<GraphRow>, DomainError>;
}
