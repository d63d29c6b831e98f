//! Strategy contracts for the three retrieval phases.
//!
//! Every strategy exposes an async and a blocking entry point with identical
//! results. The blocking form drives the async one on a private
//! current-thread runtime unless the strategy overrides it.

use std::fmt::Debug;
use std::future::Future;

use async_trait::async_trait;

use super::{PostRetrievalType, PreRetrievalType, RetrieverKind, SearchResult};
use crate::domain::DomainError;

/// Transforms the user query before it is embedded
#[async_trait]
pub trait PreRetrievalStrategy: Send + Sync + Debug {
    async fn execute_async(&self, query: &str) -> Result<String, DomainError>;

    fn execute(&self, query: &str) -> Result<String, DomainError> {
        block_on(self.execute_async(query))
    }

    fn kind(&self) -> PreRetrievalType;
}

/// Fetches documents for a query vector
#[async_trait]
pub trait RetrievalStrategy: Send + Sync + Debug {
    async fn execute_async(
        &self,
        vector: &[f32],
        threshold: f64,
        top_k: u32,
    ) -> Result<Vec<SearchResult>, DomainError>;

    fn execute(
        &self,
        vector: &[f32],
        threshold: f64,
        top_k: u32,
    ) -> Result<Vec<SearchResult>, DomainError> {
        block_on(self.execute_async(vector, threshold, top_k))
    }

    fn kind(&self) -> RetrieverKind;
}

/// Refines retrieved documents
#[async_trait]
pub trait PostRetrievalStrategy: Send + Sync + Debug {
    async fn execute_async(
        &self,
        documents: Vec<SearchResult>,
    ) -> Result<Vec<SearchResult>, DomainError>;

    fn execute(&self, documents: Vec<SearchResult>) -> Result<Vec<SearchResult>, DomainError> {
        block_on(self.execute_async(documents))
    }

    fn kind(&self) -> PostRetrievalType;
}

/// Run a future to completion from synchronous code.
///
/// Must not be called from inside a tokio runtime; that would block a
/// worker thread, so it is reported as an error instead.
pub fn block_on<F, T>(future: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(DomainError::internal(
            "blocking strategy entry point called from within an async runtime",
        ));
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| DomainError::internal(format!("runtime error: {}", e)))?;

    rt.block_on(future)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_on_outside_runtime() {
        let value = block_on(async { Ok::<_, DomainError>(42) }).unwrap();
        assert_eq!(value, 42);
    }

    #[tokio::test]
    async fn test_block_on_inside_runtime_is_rejected() {
        let result = block_on(async { Ok::<_, DomainError>(42) });
        assert!(matches!(result, Err(DomainError::Internal { .. })));
    }
}
