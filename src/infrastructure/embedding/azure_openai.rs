//! Azure OpenAI embedding provider implementation

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::embedding::{Embedding, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;
use crate::infrastructure::llm::AzureOpenAiConfig;

/// Azure OpenAI embedding provider; the request's model selects the deployment
#[derive(Debug)]
pub struct AzureOpenAiEmbeddingProvider<C: HttpClientTrait> {
    client: C,
    config: AzureOpenAiConfig,
}

impl<C: HttpClientTrait> AzureOpenAiEmbeddingProvider<C> {
    pub fn new(client: C, config: AzureOpenAiConfig) -> Self {
        Self { client, config }
    }

    fn embeddings_url(&self, request: &EmbeddingRequest) -> String {
        self.config
            .deployment_url(request.model().deployment_name(), "embeddings")
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<EmbeddingResponse, DomainError> {
        let response: AzureEmbeddingResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(
                "azure_openai",
                format!("Failed to parse embedding response: {}", e),
            )
        })?;

        let embeddings: Vec<Embedding> = response
            .data
            .into_iter()
            .map(|d| Embedding::new(d.index, d.embedding))
            .collect();

        Ok(EmbeddingResponse::new(response.model, embeddings))
    }
}

#[async_trait]
impl<C: HttpClientTrait> EmbeddingProvider for AzureOpenAiEmbeddingProvider<C> {
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
        let url = self.embeddings_url(&request);
        let body = serde_json::json!({ "input": request.inputs() });

        let response = self
            .client
            .post_json(&url, self.config.headers(), &body)
            .await?;

        self.parse_response(response)
    }

    fn provider_name(&self) -> &'static str {
        "azure_openai"
    }
}

#[derive(Debug, Deserialize)]
struct AzureEmbeddingResponse {
    #[serde(default)]
    model: String,
    data: Vec<AzureEmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct AzureEmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}
