//! Refinement of retrieved documents

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::retrieval::{PostRetrievalStrategy, PostRetrievalType};
use crate::domain::{DomainError, SearchResult};

/// Returns the documents unchanged
#[derive(Debug, Default)]
pub struct DefaultPostRetrieval;

#[async_trait]
impl PostRetrievalStrategy for DefaultPostRetrieval {
    async fn execute_async(
        &self,
        documents: Vec<SearchResult>,
    ) -> Result<Vec<SearchResult>, DomainError> {
        Ok(documents)
    }

    fn execute(&self, documents: Vec<SearchResult>) -> Result<Vec<SearchResult>, DomainError> {
        Ok(documents)
    }

    fn kind(&self) -> PostRetrievalType {
        PostRetrievalType::Default
    }
}

/// Factory for post-retrieval strategies
#[derive(Debug)]
pub struct PostRetrievalFactory;

impl PostRetrievalFactory {
    pub fn create(kind: PostRetrievalType) -> Arc<dyn PostRetrievalStrategy> {
        match kind {
            PostRetrievalType::Default => Arc::new(DefaultPostRetrieval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RetrieverKind;

    fn docs() -> Vec<SearchResult> {
        vec![
            SearchResult::new("b", "", "second", 0.6, RetrieverKind::Vector),
            SearchResult::new("a", "", "first", 0.9, RetrieverKind::Vector),
        ]
    }

    #[tokio::test]
    async fn test_default_keeps_documents_and_order() {
        let strategy = PostRetrievalFactory::create(PostRetrievalType::Default);

        let refined = strategy.execute_async(docs()).await.unwrap();
        assert_eq!(refined, docs());
        assert_eq!(strategy.kind(), PostRetrievalType::Default);
    }

    #[test]
    fn test_blocking_entry_point() {
        let strategy = DefaultPostRetrieval;
        assert_eq!(strategy.execute(docs()).unwrap(), docs());
    }
}
