//! Provider resolver trait for resolving chat models to LLM providers

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

use super::LlmProvider;
use crate::domain::{ChatModel, DomainError};

/// Trait for resolving a chat model to the provider serving its deployment.
///
/// Models live in different regions, each with its own endpoint and key,
/// so the pipeline asks the resolver for a client per generation call.
#[async_trait]
pub trait ProviderResolver: Send + Sync + Debug {
    async fn resolve(&self, model: ChatModel) -> Result<Arc<dyn LlmProvider>, DomainError>;
}

/// A provider resolver that always returns the same provider.
#[derive(Debug)]
pub struct StaticProviderResolver {
    provider: Arc<dyn LlmProvider>,
}

impl StaticProviderResolver {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ProviderResolver for StaticProviderResolver {
    async fn resolve(&self, _model: ChatModel) -> Result<Arc<dyn LlmProvider>, DomainError> {
        Ok(self.provider.clone())
    }
}
