//! Domain layer - Core pipeline types, contracts and errors

pub mod chat;
pub mod deployment;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod retrieval;

pub use chat::{ChatRecord, ChatRecordRepository, ChatRequest, ChatResponse, StreamEvent};
pub use deployment::{ChatModel, DeploymentRegion, EmbeddingModel};
pub use embedding::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
pub use error::{DomainError, PipelinePhase};
pub use llm::{
    FinishReason, LlmProvider, LlmRequest, LlmResponse, LlmStream, Message,
    MessageRole, ProviderResolver, StaticProviderResolver, StreamChunk, TokenUsage,
};
pub use prompt::{PromptTemplate, TemplateError, TemplateRepository};
pub use retrieval::{
    GraphSearchBackend, PostRetrievalStrategy, PostRetrievalType, PreRetrievalStrategy,
    PreRetrievalType, RetrievalConfig, RetrievalStepResult, RetrievalStrategy,
    RetrieverDescriptor, RetrieverKind, RetrieverRepository, SearchResult, VectorSearchBackend,
};
