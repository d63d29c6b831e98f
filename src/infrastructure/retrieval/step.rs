//! One retrieval step: transform, embed, retrieve, refine

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, instrument};

use super::{PostRetrievalFactory, PreRetrievalFactory, RetrievalBackends, RetrievalFactory, TransformationLlm};
use crate::domain::retrieval::{PostRetrievalStrategy, PreRetrievalStrategy, RetrievalStrategy};
use crate::domain::{
    DomainError, EmbeddingProvider, EmbeddingRequest, PipelinePhase, RetrievalConfig,
    RetrievalStepResult,
};

/// Milliseconds elapsed since `start`
pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// A retrieval configuration bound to its strategies
#[derive(Debug)]
pub struct RetrievalStep {
    config: RetrievalConfig,
    pre: Arc<dyn PreRetrievalStrategy>,
    embeddings: Arc<dyn EmbeddingProvider>,
    retrieval: Arc<dyn RetrievalStrategy>,
    post: Arc<dyn PostRetrievalStrategy>,
}

impl RetrievalStep {
    /// Resolve the strategies for `config`; a missing backend fails here,
    /// before any work is done
    pub fn build(
        config: RetrievalConfig,
        llm: &TransformationLlm,
        embeddings: Arc<dyn EmbeddingProvider>,
        backends: &RetrievalBackends,
    ) -> Result<Self, DomainError> {
        let retrieval = RetrievalFactory::create(config.retriever(), backends)
            .map_err(|e| e.in_phase(PipelinePhase::Retrieval))?;

        Ok(Self {
            pre: PreRetrievalFactory::create(config.pre_retrieval_type(), llm),
            post: PostRetrievalFactory::create(config.post_retrieval_type()),
            config,
            embeddings,
            retrieval,
        })
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Run the four phases in order.
    ///
    /// Errors carry the phase they occurred in.
    #[instrument(skip(self, query), fields(retriever = self.config.retriever().name()))]
    pub async fn run(&self, query: &str) -> Result<RetrievalStepResult, DomainError> {
        let start = Instant::now();
        let transformed = self
            .pre
            .execute_async(query)
            .await
            .map_err(|e| e.in_phase(PipelinePhase::PreRetrieval))?;
        let pre_retrieval_duration_ms = elapsed_ms(start);

        let vector = self.embed(&transformed).await?;

        let start = Instant::now();
        let retrieved = self
            .retrieval
            .execute_async(&vector, self.config.threshold(), self.config.top_k())
            .await
            .map_err(|e| e.in_phase(PipelinePhase::Retrieval))?;
        let retrieval_duration_ms = elapsed_ms(start);

        let start = Instant::now();
        let post_retrieved = self
            .post
            .execute_async(retrieved.clone())
            .await
            .map_err(|e| e.in_phase(PipelinePhase::PostRetrieval))?;
        let post_retrieval_duration_ms = elapsed_ms(start);

        debug!(
            pre_ms = pre_retrieval_duration_ms,
            retrieval_ms = retrieval_duration_ms,
            post_ms = post_retrieval_duration_ms,
            documents = post_retrieved.len(),
            "PERF retrieval step"
        );

        Ok(RetrievalStepResult {
            config: self.config.clone(),
            initial_query: query.to_string(),
            pre_retrieval_query: transformed,
            pre_retrieval_duration_ms,
            retrieved,
            retrieval_duration_ms,
            post_retrieved,
            post_retrieval_duration_ms,
        })
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let model = self.config.retriever().embedding_model();

        self.embeddings
            .embed(EmbeddingRequest::single(model, text))
            .await
            .and_then(|response| {
                response.into_first_vector().ok_or_else(|| {
                    DomainError::provider(
                        self.embeddings.provider_name(),
                        "Embedding response contained no vectors",
                    )
                })
            })
            .map_err(|e| e.in_phase(PipelinePhase::Embedding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::MockEmbeddingProvider;
    use crate::domain::llm::MockLlmProvider;
    use crate::domain::retrieval::{MockGraphSearchBackend, MockVectorSearchBackend};
    use crate::domain::{
        ChatModel, EmbeddingModel, PreRetrievalType, RetrieverDescriptor, StaticProviderResolver,
    };
    use serde_json::json;
    use std::time::Duration;

    fn llm(reply: &str) -> TransformationLlm {
        TransformationLlm::new(
            Arc::new(StaticProviderResolver::new(Arc::new(
                MockLlmProvider::new("mock").with_reply(reply),
            ))),
            ChatModel::Gpt4o,
        )
    }

    fn vector_config() -> RetrievalConfig {
        let descriptor = RetrieverDescriptor::vector(
            "docs",
            "docs-index",
            EmbeddingModel::TextEmbedding3Small,
            vec!["name".to_string(), "content".to_string()],
            [("name", "name"), ("content", "content")]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
        .unwrap();

        RetrievalConfig::new(descriptor)
    }

    #[tokio::test]
    async fn test_step_records_every_phase() {
        let embeddings = Arc::new(MockEmbeddingProvider::new("mock", 4));
        let backends = RetrievalBackends::new(2).with_vector(Arc::new(
            MockVectorSearchBackend::new()
                .with_row(json!({"@search.score": 0.9, "name": "a", "content": "alpha"}))
                .with_row(json!({"@search.score": 0.2, "name": "b", "content": "beta"})),
        ));
        let config = vector_config().with_pre_retrieval(PreRetrievalType::Hyde);

        let step = RetrievalStep::build(config, &llm("hypothetical doc"), embeddings.clone(), &backends)
            .unwrap();
        let result = step.run("what is alpha?").await.unwrap();

        assert_eq!(result.initial_query, "what is alpha?");
        assert_eq!(result.pre_retrieval_query, "hypothetical doc");
        assert_eq!(result.retrieved.len(), 1);
        assert_eq!(result.post_retrieved, result.retrieved);
        assert_eq!(result.contributions(), vec!["alpha".to_string()]);
        assert!(result.retrieval_duration_ms >= 0.0);

        let calls = embeddings.calls();
        assert_eq!(calls[0].0, EmbeddingModel::TextEmbedding3Small);
        assert_eq!(calls[0].1, vec!["hypothetical doc".to_string()]);
    }

    #[tokio::test]
    async fn test_errors_are_tagged_with_phase() {
        let backends = RetrievalBackends::new(2)
            .with_vector(Arc::new(MockVectorSearchBackend::new().with_error("HTTP 503")));

        let failing_embeddings = Arc::new(MockEmbeddingProvider::new("mock", 4).with_error("down"));
        let step =
            RetrievalStep::build(vector_config(), &llm("x"), failing_embeddings, &backends).unwrap();
        let err = step.run("q").await.unwrap_err();
        assert_eq!(err.phase(), Some(PipelinePhase::Embedding));

        let embeddings = Arc::new(MockEmbeddingProvider::new("mock", 4));
        let step = RetrievalStep::build(vector_config(), &llm("x"), embeddings, &backends).unwrap();
        let err = step.run("q").await.unwrap_err();
        assert_eq!(err.phase(), Some(PipelinePhase::Retrieval));
    }

    #[tokio::test]
    async fn test_retrieval_duration_excludes_embedding() {
        let embeddings =
            Arc::new(MockEmbeddingProvider::new("mock", 4).with_delay(Duration::from_millis(300)));
        let backends = RetrievalBackends::new(2).with_vector(Arc::new(
            MockVectorSearchBackend::new()
                .with_row(json!({"@search.score": 0.9, "name": "a", "content": "alpha"})),
        ));

        let step = RetrievalStep::build(vector_config(), &llm("x"), embeddings, &backends).unwrap();
        let result = step.run("q").await.unwrap();

        assert!(
            result.retrieval_duration_ms < 100.0,
            "retrieval took {}ms",
            result.retrieval_duration_ms
        );
        assert!(result.pre_retrieval_duration_ms < 100.0);
    }

    #[test]
    fn test_build_fails_without_backend() {
        let backends = RetrievalBackends::new(2).with_graph(Arc::new(MockGraphSearchBackend::new()));
        let embeddings = Arc::new(MockEmbeddingProvider::new("mock", 4));

        let err = RetrievalStep::build(vector_config(), &llm("x"), embeddings, &backends).unwrap_err();

        assert_eq!(err.phase(), Some(PipelinePhase::Retrieval));
        assert!(matches!(err.root(), DomainError::Configuration { .. }));
    }
}
