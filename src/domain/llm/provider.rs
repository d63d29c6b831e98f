use async_trait::async_trait;
use futures::Stream;
use std::fmt::Debug;
use std::pin::Pin;

use super::response::StreamChunk;
use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Stream type for LLM responses
pub type LlmStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, DomainError>> + Send>>;

/// Trait for chat completion backends
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request to the given deployment
    async fn chat(&self, deployment: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Send a streaming chat completion request.
    ///
    /// Fragments are yielded in the order the backend produced them.
    async fn chat_stream(
        &self,
        deployment: &str,
        request: LlmRequest,
    ) -> Result<LlmStream, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
