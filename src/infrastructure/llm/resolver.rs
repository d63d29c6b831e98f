//! Per-model Azure OpenAI client cache

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use super::azure_openai::{AzureOpenAiConfig, AzureOpenAiProvider};
use crate::domain::{ChatModel, DeploymentRegion, DomainError, LlmProvider, ProviderResolver};
use crate::infrastructure::http_client::HttpClientTrait;

/// Resolves chat models to Azure OpenAI clients for their region.
///
/// Clients are built on first use and kept for the lifetime of the resolver.
#[derive(Debug)]
pub struct AzureProviderResolver<C: HttpClientTrait + Clone + 'static> {
    client: C,
    primary: AzureOpenAiConfig,
    secondary: Option<AzureOpenAiConfig>,
    cache: Cache<ChatModel, Arc<dyn LlmProvider>>,
}

impl<C: HttpClientTrait + Clone + 'static> AzureProviderResolver<C> {
    pub fn new(client: C, primary: AzureOpenAiConfig) -> Self {
        Self {
            client,
            primary,
            secondary: None,
            cache: Cache::builder().max_capacity(ChatModel::ALL.len() as u64).build(),
        }
    }

    pub fn with_secondary(mut self, secondary: AzureOpenAiConfig) -> Self {
        self.secondary = Some(secondary);
        self
    }

    fn config_for(&self, model: ChatModel) -> Result<&AzureOpenAiConfig, DomainError> {
        match model.region() {
            DeploymentRegion::Primary => Ok(&self.primary),
            DeploymentRegion::Secondary => self.secondary.as_ref().ok_or_else(|| {
                DomainError::configuration(format!(
                    "Model '{}' is deployed in the secondary region, which is not configured",
                    model
                ))
            }),
        }
    }

    pub fn cache_size(&self) -> u64 {
        self.cache.entry_count()
    }
}

#[async_trait]
impl<C: HttpClientTrait + Clone + 'static> ProviderResolver for AzureProviderResolver<C> {
    async fn resolve(&self, model: ChatModel) -> Result<Arc<dyn LlmProvider>, DomainError> {
        if let Some(cached) = self.cache.get(&model).await {
            return Ok(cached);
        }

        let config = self.config_for(model)?.clone();
        debug!(model = %model, endpoint = %config.endpoint, "Creating LLM client");

        let provider: Arc<dyn LlmProvider> =
            Arc::new(AzureOpenAiProvider::new(self.client.clone(), config));
        self.cache.insert(model, provider.clone()).await;

        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::HttpClient;

    fn resolver() -> AzureProviderResolver<HttpClient> {
        AzureProviderResolver::new(
            HttpClient::new(),
            AzureOpenAiConfig::new("https://us.example.com", "us-key"),
        )
    }

    #[tokio::test]
    async fn test_same_model_reuses_client() {
        let resolver = resolver();

        let first = resolver.resolve(ChatModel::Gpt4o).await.unwrap();
        let second = resolver.resolve(ChatModel::Gpt4o).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.provider_name(), "azure_openai");
    }

    #[tokio::test]
    async fn test_secondary_region_requires_configuration() {
        let result = resolver().resolve(ChatModel::Gpt4Turbo).await;
        assert!(matches!(result, Err(DomainError::Configuration { .. })));

        let resolver = resolver()
            .with_secondary(AzureOpenAiConfig::new("https://se.example.com", "se-key"));
        assert!(resolver.resolve(ChatModel::Gpt4Turbo).await.is_ok());
    }
}
