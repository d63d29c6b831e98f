//! Process-wide pipeline dependencies

use std::sync::Arc;

use super::{PromptAssembler, TiktokenCounter, TokenAccountant, TokenCounter};
use crate::domain::{
    ChatModel, EmbeddingProvider, GraphSearchBackend, ProviderResolver, TemplateRepository,
    VectorSearchBackend,
};
use crate::infrastructure::retrieval::{RetrievalBackends, TransformationLlm};

pub const DEFAULT_GRAPH_CONCURRENCY: usize = 4;
pub const DEFAULT_STREAM_BUFFER: usize = 64;

/// Everything a pipeline run needs, built once and shared.
///
/// Per-model LLM clients are cached by the resolver held here.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    resolver: Arc<dyn ProviderResolver>,
    embeddings: Arc<dyn EmbeddingProvider>,
    templates: Arc<dyn TemplateRepository>,
    vector: Option<Arc<dyn VectorSearchBackend>>,
    graph: Option<Arc<dyn GraphSearchBackend>>,
    graph_concurrency: usize,
    counter: Arc<dyn TokenCounter>,
    transformation_model: ChatModel,
    max_history_turns: Option<usize>,
    stream_buffer: usize,
}

impl PipelineContext {
    pub fn new(
        resolver: Arc<dyn ProviderResolver>,
        embeddings: Arc<dyn EmbeddingProvider>,
        templates: Arc<dyn TemplateRepository>,
    ) -> Self {
        Self {
            resolver,
            embeddings,
            templates,
            vector: None,
            graph: None,
            graph_concurrency: DEFAULT_GRAPH_CONCURRENCY,
            counter: Arc::new(TiktokenCounter::new()),
            transformation_model: ChatModel::default(),
            max_history_turns: None,
            stream_buffer: DEFAULT_STREAM_BUFFER,
        }
    }

    pub fn with_vector_backend(mut self, backend: Arc<dyn VectorSearchBackend>) -> Self {
        self.vector = Some(backend);
        self
    }

    pub fn with_graph_backend(mut self, backend: Arc<dyn GraphSearchBackend>, max_concurrency: usize) -> Self {
        self.graph = Some(backend);
        self.graph_concurrency = max_concurrency;
        self
    }

    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    pub fn with_transformation_model(mut self, model: ChatModel) -> Self {
        self.transformation_model = model;
        self
    }

    pub fn with_max_history_turns(mut self, turns: Option<usize>) -> Self {
        self.max_history_turns = turns;
        self
    }

    pub fn with_stream_buffer(mut self, size: usize) -> Self {
        self.stream_buffer = size.max(1);
        self
    }

    pub fn resolver(&self) -> &Arc<dyn ProviderResolver> {
        &self.resolver
    }

    pub fn embeddings(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embeddings
    }

    pub fn stream_buffer(&self) -> usize {
        self.stream_buffer
    }

    pub fn transformation_llm(&self) -> TransformationLlm {
        TransformationLlm::new(self.resolver.clone(), self.transformation_model)
    }

    /// Backends for the retrieval strategies; each call creates a new graph
    /// semaphore, so build once per pipeline
    pub(crate) fn retrieval_backends(&self) -> RetrievalBackends {
        let mut backends = RetrievalBackends::new(self.graph_concurrency);
        if let Some(ref vector) = self.vector {
            backends = backends.with_vector(vector.clone());
        }
        if let Some(ref graph) = self.graph {
            backends = backends.with_graph(graph.clone());
        }
        backends
    }

    pub fn prompt_assembler(&self) -> PromptAssembler {
        PromptAssembler::new(self.templates.clone(), self.max_history_turns)
    }

    pub fn accountant(&self) -> TokenAccountant {
        TokenAccountant::new(self.counter.clone())
    }
}
