//! Retrieval domain: configuration, results, strategy contracts and backends

mod backend;
mod config;
mod repository;
mod result;
mod strategy;
mod validation;

pub use backend::{
    GraphRow, GraphSearchBackend, SearchRow, VectorSearchBackend, VectorSearchRequest,
    SEARCH_SCORE_FIELD, VECTOR_FIELD,
};
pub use config::{
    PostRetrievalType, PreRetrievalType, RetrievalConfig, RetrieverDescriptor, RetrieverKind,
    DEFAULT_CONTEXT_KEY, DEFAULT_THRESHOLD, DEFAULT_TOP_K,
};
pub use repository::{in_memory::InMemoryRetrieverRepository, RetrieverRepository, StoredRetriever};
pub use result::{RetrievalStepResult, SearchResult};
pub use strategy::{block_on, PostRetrievalStrategy, PreRetrievalStrategy, RetrievalStrategy};
pub use validation::{validate_threshold, validate_top_k, RetrievalValidationError};

#[cfg(test)]
pub use backend::mock::{MockGraphSearchBackend, MockVectorSearchBackend};
