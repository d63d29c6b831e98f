use serde::Deserialize;

use crate::domain::ChatModel;
use crate::infrastructure::llm::azure_openai::DEFAULT_API_VERSION;
use crate::infrastructure::pipeline::{DEFAULT_GRAPH_CONCURRENCY, DEFAULT_STREAM_BUFFER};
use crate::infrastructure::search::DEFAULT_SEARCH_API_VERSION;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub azure_openai: AzureOpenAiSettings,
    pub search: SearchSettings,
    /// Graph retrieval is disabled when absent
    pub graph: Option<GraphSettings>,
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Azure OpenAI endpoints. Models deployed in the secondary region use the
/// secondary endpoint and key.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AzureOpenAiSettings {
    pub endpoint: String,
    pub api_key: String,
    pub secondary_endpoint: Option<String>,
    pub secondary_api_key: Option<String>,
    pub api_version: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    #[serde(default = "default_graph_database")]
    pub database: String,
    #[serde(default = "default_graph_concurrency")]
    pub max_concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Model used by LLM-backed query transformations
    pub transformation_model: ChatModel,
    /// Keep only the latest turns of chat history
    pub max_history_turns: Option<usize>,
    pub stream_buffer: usize,
}

fn default_graph_database() -> String {
    "neo4j".to_string()
}

fn default_graph_concurrency() -> usize {
    DEFAULT_GRAPH_CONCURRENCY
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for AzureOpenAiSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            secondary_endpoint: None,
            secondary_api_key: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            api_version: DEFAULT_SEARCH_API_VERSION.to_string(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            transformation_model: ChatModel::default(),
            max_history_turns: Some(10),
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert!(config.graph.is_none());
        assert_eq!(config.pipeline.max_history_turns, Some(10));
        assert_eq!(config.pipeline.transformation_model, ChatModel::Gpt4o);
        assert_eq!(config.azure_openai.api_version, DEFAULT_API_VERSION);
    }

    #[test]
    fn test_partial_sections_fill_defaults() {
        let config: AppConfig = config::Config::builder()
            .set_override("search.endpoint", "https://search.example.net")
            .unwrap()
            .set_override("graph.uri", "http://neo4j:7474")
            .unwrap()
            .set_override("graph.user", "neo4j")
            .unwrap()
            .set_override("graph.password", "secret")
            .unwrap()
            .set_override("pipeline.transformation_model", "gpt-4")
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.search.endpoint, "https://search.example.net");
        assert_eq!(config.search.api_version, DEFAULT_SEARCH_API_VERSION);

        let graph = config.graph.unwrap();
        assert_eq!(graph.database, "neo4j");
        assert_eq!(graph.max_concurrency, DEFAULT_GRAPH_CONCURRENCY);
        assert_eq!(config.pipeline.transformation_model, ChatModel::Gpt4);
        assert_eq!(config.pipeline.stream_buffer, DEFAULT_STREAM_BUFFER);
    }
}
