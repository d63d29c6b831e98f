//! Prompt template repository trait

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use super::PromptTemplate;
use crate::domain::DomainError;

/// A stored prompt template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredTemplate {
    pub id: String,
    #[serde(flatten)]
    pub template: PromptTemplate,
}

/// Repository trait for prompt template persistence.
///
/// Lookups accept either the stored id or the template name.
#[async_trait]
pub trait TemplateRepository: Send + Sync + std::fmt::Debug {
    async fn get(&self, id_or_name: &str) -> Result<Option<StoredTemplate>, DomainError>;

    async fn list(&self, skip: usize, limit: usize) -> Result<Vec<StoredTemplate>, DomainError>;

    /// Store a template, returning its id
    async fn create(&self, template: PromptTemplate) -> Result<String, DomainError>;

    async fn update(
        &self,
        id_or_name: &str,
        template: PromptTemplate,
    ) -> Result<StoredTemplate, DomainError>;

    async fn delete(&self, id_or_name: &str) -> Result<bool, DomainError>;
}

/// In-memory implementation of TemplateRepository
pub mod in_memory {
    use super::*;
    use std::sync::{Mutex, MutexGuard};

    #[derive(Debug, Default)]
    pub struct InMemoryTemplateRepository {
        templates: Mutex<Vec<StoredTemplate>>,
    }

    impl InMemoryTemplateRepository {
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> Result<MutexGuard<'_, Vec<StoredTemplate>>, DomainError> {
            self.templates
                .lock()
                .map_err(|_| DomainError::storage("template store lock poisoned"))
        }
    }

    fn is_match(stored: &StoredTemplate, id_or_name: &str) -> bool {
        stored.id == id_or_name || stored.template.name == id_or_name
    }

    fn validated(template: PromptTemplate) -> Result<PromptTemplate, DomainError> {
        template
            .validate()
            .map_err(|e| DomainError::validation(e.to_string()))?;
        Ok(template)
    }

    #[async_trait]
    impl TemplateRepository for InMemoryTemplateRepository {
        async fn get(&self, id_or_name: &str) -> Result<Option<StoredTemplate>, DomainError> {
            Ok(self.lock()?.iter().find(|t| is_match(t, id_or_name)).cloned())
        }

        async fn list(
            &self,
            skip: usize,
            limit: usize,
        ) -> Result<Vec<StoredTemplate>, DomainError> {
            Ok(self.lock()?.iter().skip(skip).take(limit).cloned().collect())
        }

        async fn create(&self, template: PromptTemplate) -> Result<String, DomainError> {
            let template = validated(template)?;
            let mut templates = self.lock()?;

            if templates.iter().any(|t| t.template.name == template.name) {
                return Err(DomainError::conflict(format!(
                    "Prompt template '{}' already exists",
                    template.name
                )));
            }

            let id = Uuid::new_v4().to_string();
            templates.push(StoredTemplate {
                id: id.clone(),
                template,
            });
            Ok(id)
        }

        async fn update(
            &self,
            id_or_name: &str,
            template: PromptTemplate,
        ) -> Result<StoredTemplate, DomainError> {
            let template = validated(template)?;
            let mut templates = self.lock()?;
            let stored = templates
                .iter_mut()
                .find(|t| is_match(t, id_or_name))
                .ok_or_else(|| {
                    DomainError::not_found(format!("Prompt template '{}' not found", id_or_name))
                })?;

            stored.template = template;
            Ok(stored.clone())
        }

        async fn delete(&self, id_or_name: &str) -> Result<bool, DomainError> {
            let mut templates = self.lock()?;
            let before = templates.len();
            templates.retain(|t| !is_match(t, id_or_name));
            Ok(templates.len() != before)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_create_and_get_by_name() {
            let repo = InMemoryTemplateRepository::new();
            let id = repo
                .create(PromptTemplate::new("qa", "Answer using {context}"))
                .await
                .unwrap();

            let by_name = repo.get("qa").await.unwrap().unwrap();
            assert_eq!(by_name.id, id);
            assert_eq!(by_name.template.template, "Answer using {context}");
        }

        #[tokio::test]
        async fn test_invalid_template_rejected() {
            let repo = InMemoryTemplateRepository::new();
            let result = repo.create(PromptTemplate::new("qa", "   ")).await;

            assert!(matches!(result, Err(DomainError::Validation { .. })));
        }

        #[tokio::test]
        async fn test_update_missing_template() {
            let repo = InMemoryTemplateRepository::new();
            let result = repo
                .update("nope", PromptTemplate::new("nope", "{context}"))
                .await;

            assert!(matches!(result, Err(DomainError::NotFound { .. })));
        }

        #[tokio::test]
        async fn test_update_replaces_content() {
            let repo = InMemoryTemplateRepository::new();
            let id = repo
                .create(PromptTemplate::new("qa", "v1 {context}"))
                .await
                .unwrap();

            let updated = repo
                .update(&id, PromptTemplate::new("qa", "v2 {context}"))
                .await
                .unwrap();

            assert_eq!(updated.template.template, "v2 {context}");
            assert_eq!(repo.list(0, 10).await.unwrap().len(), 1);
        }
    }
}
