//! Azure AI Search vector index client

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::domain::retrieval::{SearchRow, VectorSearchBackend, VectorSearchRequest};
use crate::domain::DomainError;
use crate::infrastructure::http_client::HttpClientTrait;

pub const DEFAULT_SEARCH_API_VERSION: &str = "2024-07-01";

/// Azure AI Search configuration
#[derive(Debug, Clone)]
pub struct AzureSearchConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
}

impl AzureSearchConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_version: DEFAULT_SEARCH_API_VERSION.to_string(),
        }
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }
}

/// Vector search over Azure AI Search indexes
#[derive(Debug)]
pub struct AzureSearchBackend<C: HttpClientTrait> {
    client: C,
    config: AzureSearchConfig,
}

impl<C: HttpClientTrait> AzureSearchBackend<C> {
    pub fn new(client: C, config: AzureSearchConfig) -> Self {
        Self { client, config }
    }

    fn search_url(&self, index: &str) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            index,
            self.config.api_version
        )
    }

    fn build_request(request: &VectorSearchRequest) -> serde_json::Value {
        serde_json::json!({
            "vectorQueries": [{
                "kind": "vector",
                "vector": request.vector,
                "k": request.top_k,
                "fields": request.field,
            }],
            "select": request.select.join(","),
        })
    }
}

#[async_trait]
impl<C: HttpClientTrait> VectorSearchBackend for AzureSearchBackend<C> {
    async fn vector_search(
        &self,
        request: &VectorSearchRequest,
    ) -> Result<Vec<SearchRow>, DomainError> {
        let url = self.search_url(&request.index);
        let body = Self::build_request(request);
        let headers = vec![
            ("api-key", self.config.api_key.as_str()),
            ("Content-Type", "application/json"),
        ];

        let json = self
            .client
            .post_json(&url, headers, &body)
            .await
            .map_err(|e| match e {
                DomainError::Provider { message, .. } => DomainError::provider("azure_search", message),
                other => other,
            })?;

        let response: AzureSearchResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("azure_search", format!("Failed to parse response: {}", e))
        })?;

        debug!(index = %request.index, hits = response.value.len(), "Vector search completed");
        Ok(response.value)
    }
}

#[derive(Debug, Deserialize)]
struct AzureSearchResponse {
    #[serde(default)]
    value: Vec<SearchRow>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::retrieval::VECTOR_FIELD;
    use crate::infrastructure::http_client::mock::MockHttpClient;

    const URL: &str =
        "https://search.example.net/indexes/docs-index/docs/search?api-version=2024-07-01";

    fn request() -> VectorSearchRequest {
        VectorSearchRequest {
            index: "docs-index".to_string(),
            vector: vec![0.5, 0.25],
            select: vec!["name".to_string(), "content".to_string()],
            top_k: 3,
            field: VECTOR_FIELD,
        }
    }

    #[tokio::test]
    async fn test_vector_search_request_and_rows() {
        let client = MockHttpClient::new().with_response(
            URL,
            serde_json::json!({
                "value": [
                    {"@search.score": 0.91, "name": "a", "content": "alpha"},
                    {"@search.score": 0.42, "name": "b", "content": "beta"}
                ]
            }),
        );
        let backend = AzureSearchBackend::new(
            client,
            AzureSearchConfig::new("https://search.example.net/", "key"),
        );

        let rows = backend.vector_search(&request()).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "a");

        let (_, body) = backend.client.bodies().remove(0);
        assert_eq!(body["select"], "name,content");
        assert_eq!(body["vectorQueries"][0]["k"], 3);
        assert_eq!(body["vectorQueries"][0]["fields"], "embedding");
        assert_eq!(body["vectorQueries"][0]["kind"], "vector");
    }

    #[tokio::test]
    async fn test_vector_search_error_names_backend() {
        let client = MockHttpClient::new().with_error(URL, "HTTP 403");
        let backend =
            AzureSearchBackend::new(client, AzureSearchConfig::new("https://search.example.net", "key"));

        let err = backend.vector_search(&request()).await.unwrap_err();
        assert!(matches!(err, DomainError::Provider { ref provider, .. } if provider == "azure_search"));
    }
}
