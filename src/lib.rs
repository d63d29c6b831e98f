//! RAG Pipeline API
//!
//! Retrieval-augmented chat over Azure OpenAI with:
//! - Vector retrieval through Azure AI Search
//! - Graph retrieval through Neo4j
//! - Pre/post retrieval strategies and prompt templates
//! - Streaming responses and token accounting

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::chat::InMemoryChatRecordRepository;
use domain::prompt::InMemoryTemplateRepository;
use domain::retrieval::InMemoryRetrieverRepository;
use domain::TemplateRepository;
use infrastructure::embedding::AzureOpenAiEmbeddingProvider;
use infrastructure::http_client::HttpClient;
use infrastructure::llm::{AzureOpenAiConfig, AzureProviderResolver};
use infrastructure::pipeline::{Pipeline, PipelineContext, TiktokenCounter};
use infrastructure::search::{AzureSearchBackend, AzureSearchConfig, Neo4jConfig, Neo4jGraphBackend};
use tracing::{info, warn};

/// Create the application state from configuration
pub fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let http = HttpClient::with_timeout(Duration::from_secs(config.azure_openai.timeout_secs))?;

    let azure = &config.azure_openai;
    if azure.endpoint.is_empty() {
        warn!("Azure OpenAI endpoint is not configured; chat requests will fail");
    }
    let primary = AzureOpenAiConfig::new(&azure.endpoint, &azure.api_key)
        .with_api_version(&azure.api_version);

    let mut resolver = AzureProviderResolver::new(http.clone(), primary.clone());
    if let (Some(endpoint), Some(key)) = (&azure.secondary_endpoint, &azure.secondary_api_key) {
        info!(endpoint = %endpoint, "Secondary Azure OpenAI region configured");
        resolver = resolver.with_secondary(
            AzureOpenAiConfig::new(endpoint, key).with_api_version(&azure.api_version),
        );
    }

    let templates: Arc<dyn TemplateRepository> = Arc::new(InMemoryTemplateRepository::new());

    let mut context = PipelineContext::new(
        Arc::new(resolver),
        Arc::new(AzureOpenAiEmbeddingProvider::new(http.clone(), primary)),
        templates.clone(),
    )
    .with_token_counter(Arc::new(TiktokenCounter::new()))
    .with_transformation_model(config.pipeline.transformation_model)
    .with_max_history_turns(config.pipeline.max_history_turns)
    .with_stream_buffer(config.pipeline.stream_buffer);

    if config.search.endpoint.is_empty() {
        info!("Vector search disabled: no search endpoint configured");
    } else {
        info!(endpoint = %config.search.endpoint, "Vector search enabled");
        let search = AzureSearchConfig::new(&config.search.endpoint, &config.search.api_key)
            .with_api_version(&config.search.api_version);
        context = context.with_vector_backend(Arc::new(AzureSearchBackend::new(http, search)));
    }

    match &config.graph {
        Some(graph) => {
            info!(uri = %graph.uri, max_concurrency = graph.max_concurrency, "Graph search enabled");
            let neo4j = Neo4jConfig::new(&graph.uri, &graph.user, &graph.password)
                .with_database(&graph.database);
            context = context
                .with_graph_backend(Arc::new(Neo4jGraphBackend::new(neo4j)), graph.max_concurrency);
        }
        None => info!("Graph search disabled: no graph settings configured"),
    }

    Ok(AppState::new(
        Pipeline::new(context),
        templates,
        Arc::new(InMemoryRetrieverRepository::new()),
        Arc::new(InMemoryChatRecordRepository::new()),
    ))
}
