//! LLM provider implementations

pub mod azure_openai;
pub mod resolver;

pub use azure_openai::{AzureOpenAiConfig, AzureOpenAiProvider};
pub use resolver::AzureProviderResolver;
