//! Retriever descriptor repository trait

use async_trait::async_trait;
use uuid::Uuid;

use super::RetrieverDescriptor;
use crate::domain::DomainError;

/// A stored retriever descriptor
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StoredRetriever {
    pub id: String,
    #[serde(flatten)]
    pub descriptor: RetrieverDescriptor,
}

/// Repository trait for retriever descriptor persistence.
///
/// Lookups accept either the stored id or the retriever name.
#[async_trait]
pub trait RetrieverRepository: Send + Sync + std::fmt::Debug {
    async fn get(&self, id_or_name: &str) -> Result<Option<StoredRetriever>, DomainError>;

    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<StoredRetriever>, DomainError>;

    /// Store a descriptor, returning its id
    async fn create(&self, descriptor: RetrieverDescriptor) -> Result<String, DomainError>;

    async fn update(
        &self,
        id_or_name: &str,
        descriptor: RetrieverDescriptor,
    ) -> Result<StoredRetriever, DomainError>;

    async fn delete(&self, id_or_name: &str) -> Result<bool, DomainError>;
}

/// In-memory implementation of RetrieverRepository
pub mod in_memory {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    pub struct InMemoryRetrieverRepository {
        retrievers: Mutex<Vec<StoredRetriever>>,
    }

    impl InMemoryRetrieverRepository {
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<StoredRetriever>>, DomainError> {
            self.retrievers
                .lock()
                .map_err(|_| DomainError::storage("retriever store lock poisoned"))
        }
    }

    fn is_match(stored: &StoredRetriever, id_or_name: &str) -> bool {
        stored.id == id_or_name || stored.descriptor.name() == id_or_name
    }

    #[async_trait]
    impl RetrieverRepository for InMemoryRetrieverRepository {
        async fn get(&self, id_or_name: &str) -> Result<Option<StoredRetriever>, DomainError> {
            Ok(self.lock()?.iter().find(|r| is_match(r, id_or_name)).cloned())
        }

        async fn list(
            &self,
            skip: usize,
            limit: usize,
        ) -> Result<Vec<StoredRetriever>, DomainError> {
            Ok(self.lock()?.iter().skip(skip).take(limit).cloned().collect())
        }

        async fn create(&self, descriptor: RetrieverDescriptor) -> Result<String, DomainError> {
            let mut retrievers = self.lock()?;

            if retrievers.iter().any(|r| r.descriptor.name() == descriptor.name()) {
                return Err(DomainError::conflict(format!(
                    "Retriever '{}' already exists",
                    descriptor.name()
                )));
            }

            let id = Uuid::new_v4().to_string();
            retrievers.push(StoredRetriever {
                id: id.clone(),
                descriptor,
            });
            Ok(id)
        }

        async fn update(
            &self,
            id_or_name: &str,
            descriptor: RetrieverDescriptor,
        ) -> Result<StoredRetriever, DomainError> {
            let mut retrievers = self.lock()?;
            let stored = retrievers
                .iter_mut()
                .find(|r| is_match(r, id_or_name))
                .ok_or_else(|| {
                    DomainError::not_found(format!("Retriever '{}' not found", id_or_name))
                })?;

            stored.descriptor = descriptor;
            Ok(stored.clone())
        }

        async fn delete(&self, id_or_name: &str) -> Result<bool, DomainError> {
            let mut retrievers = self.lock()?;
            let before = retrievers.len();
            retrievers.retain(|r| !is_match(r, id_or_name));
            Ok(retrievers.len() != before)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::domain::EmbeddingModel;

        fn graph(name: &str) -> RetrieverDescriptor {
            RetrieverDescriptor::graph(name, EmbeddingModel::default()).unwrap()
        }

        #[tokio::test]
        async fn test_lookup_by_id_or_name() {
            let repo = InMemoryRetrieverRepository::new();
            let id = repo.create(graph("interfaces")).await.unwrap();

            assert!(repo.get(&id).await.unwrap().is_some());
            assert_eq!(
                repo.get("interfaces").await.unwrap().map(|r| r.id),
                Some(id)
            );
            assert!(repo.get("missing").await.unwrap().is_none());
        }

        #[tokio::test]
        async fn test_duplicate_name_conflicts() {
            let repo = InMemoryRetrieverRepository::new();
            repo.create(graph("interfaces")).await.unwrap();

            let result = repo.create(graph("interfaces")).await;
            assert!(matches!(result, Err(DomainError::Conflict { .. })));
        }

        #[tokio::test]
        async fn test_list_skip_limit_and_delete() {
            let repo = InMemoryRetrieverRepository::new();
            for name in ["a", "b", "c"] {
                repo.create(graph(name)).await.unwrap();
            }

            let page = repo.list(1, 1).await.unwrap();
            assert_eq!(page.len(), 1);
            assert_eq!(page[0].descriptor.name(), "b");

            assert!(repo.delete("b").await.unwrap());
            assert!(!repo.delete("b").await.unwrap());
            assert_eq!(repo.list(0, 10).await.unwrap().len(), 2);
        }
    }
}
