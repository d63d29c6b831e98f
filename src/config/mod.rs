//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, AzureOpenAiSettings, GraphSettings, LogFormat, LoggingConfig, PipelineSettings,
    SearchSettings, ServerConfig,
};
