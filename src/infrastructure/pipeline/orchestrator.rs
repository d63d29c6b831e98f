//! The RAG pipeline: retrieve, merge, assemble, generate, account

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info, instrument};

use super::{AssembledPrompt, MergedContext, PipelineContext};
use crate::domain::{
    ChatRequest, ChatResponse, DomainError, LlmProvider, LlmRequest, PipelinePhase,
    RetrievalStepResult, StreamEvent, TokenUsage,
};
use crate::infrastructure::retrieval::{elapsed_ms, RetrievalBackends, RetrievalStep};

/// Stream of events produced by a streamed run
pub type PipelineStream = ReceiverStream<Result<StreamEvent, DomainError>>;

/// Retrieval and prompt state shared by batch and streamed runs
struct Prepared {
    steps: Vec<RetrievalStepResult>,
    context: MergedContext,
    prompt: AssembledPrompt,
    provider: Arc<dyn LlmProvider>,
}

/// Runs chat requests against the configured backends
#[derive(Debug, Clone)]
pub struct Pipeline {
    context: Arc<PipelineContext>,
    backends: RetrievalBackends,
}

impl Pipeline {
    pub fn new(context: PipelineContext) -> Self {
        let backends = context.retrieval_backends();
        Self {
            context: Arc::new(context),
            backends,
        }
    }

    /// Answer a request with a single generation call
    #[instrument(skip(self, request), fields(model = %request.model, steps = request.retrieval_behaviour.len()))]
    pub async fn run(&self, request: ChatRequest) -> Result<ChatResponse, DomainError> {
        let prepared = self.prepare(&request).await?;

        let llm_request = LlmRequest::new(prepared.prompt.messages.clone());
        let generation_start = Instant::now();
        let response = prepared
            .provider
            .chat(request.model.deployment_name(), llm_request)
            .await
            .map_err(|e| e.in_phase(PipelinePhase::Generation))?;
        let generation_ms = elapsed_ms(generation_start);
        debug!(duration_ms = generation_ms, "PERF generation");

        let token_usage = self
            .context
            .accountant()
            .account(
                request.model,
                &prepared.prompt.messages,
                response.content(),
                response.usage,
            )
            .map_err(|e| e.in_phase(PipelinePhase::Generation))?;

        let answer = response.content().to_string();
        let response = Self::finish(request, prepared, answer, token_usage, generation_ms);

        info!(
            generation_ms = response.response_duration_ms,
            total_tokens = response.token_usage.total_tokens(),
            documents = response.documents.len(),
            "Chat request completed"
        );

        Ok(response)
    }

    /// Answer a request with incremental fragments.
    ///
    /// The stream yields fragments in generation order, then exactly one
    /// final event. On failure it yields the error and closes with no final
    /// event. Dropping the stream stops the run.
    pub fn run_streaming(&self, request: ChatRequest) -> PipelineStream {
        let (tx, rx) = mpsc::channel(self.context.stream_buffer());
        let pipeline = self.clone();

        tokio::spawn(async move {
            if let Err(e) = pipeline.stream_into(request, &tx).await {
                error!(error = %e, "Streamed chat request failed");
                let _ = tx.send(Err(e)).await;
            }
        });

        ReceiverStream::new(rx)
    }

    async fn stream_into(
        &self,
        request: ChatRequest,
        tx: &mpsc::Sender<Result<StreamEvent, DomainError>>,
    ) -> Result<(), DomainError> {
        let prepared = self.prepare(&request).await?;

        let llm_request = LlmRequest::streaming(prepared.prompt.messages.clone());
        let generation_start = Instant::now();

        let mut stream = prepared
            .provider
            .chat_stream(request.model.deployment_name(), llm_request)
            .await
            .map_err(|e| e.in_phase(PipelinePhase::Generation))?;

        let mut answer = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| e.in_phase(PipelinePhase::Generation))?;

            if let Some(delta) = chunk.delta.filter(|d| !d.is_empty()) {
                answer.push_str(&delta);
                if tx.send(Ok(StreamEvent::fragment(delta))).await.is_err() {
                    debug!("Stream receiver dropped, stopping generation");
                    return Ok(());
                }
            }
        }
        let generation_ms = elapsed_ms(generation_start);
        debug!(duration_ms = generation_ms, "PERF generation");

        let token_usage = self
            .context
            .accountant()
            .account(request.model, &prepared.prompt.messages, &answer, None)
            .map_err(|e| e.in_phase(PipelinePhase::Generation))?;

        let response = Self::finish(request, prepared, answer, token_usage, generation_ms);
        info!(
            generation_ms = response.response_duration_ms,
            total_tokens = response.token_usage.total_tokens(),
            "Streamed chat request completed"
        );

        let _ = tx.send(Ok(StreamEvent::finished(response))).await;
        Ok(())
    }

    async fn prepare(&self, request: &ChatRequest) -> Result<Prepared, DomainError> {
        let (steps, context) = self.retrieve(request).await?;

        let prompt = self
            .context
            .prompt_assembler()
            .assemble(request, &context)
            .await?;

        let provider = self
            .context
            .resolver()
            .resolve(request.model)
            .await
            .map_err(|e| e.in_phase(PipelinePhase::Generation))?;

        Ok(Prepared {
            steps,
            context,
            prompt,
            provider,
        })
    }

    /// Run every configured step concurrently.
    ///
    /// The first failure aborts the run and drops the remaining steps.
    /// Contributions are merged as steps complete; step results are
    /// returned in configuration order.
    async fn retrieve(
        &self,
        request: &ChatRequest,
    ) -> Result<(Vec<RetrievalStepResult>, MergedContext), DomainError> {
        let mut context = MergedContext::new();
        if request.retrieval_behaviour.is_empty() {
            return Ok((Vec::new(), context));
        }

        let llm = self.context.transformation_llm();
        let steps = request
            .retrieval_behaviour
            .iter()
            .cloned()
            .map(|config| {
                RetrievalStep::build(config, &llm, self.context.embeddings().clone(), &self.backends)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let query = request.query.as_str();
        let mut pending: FuturesUnordered<_> = steps
            .iter()
            .enumerate()
            .map(|(idx, step)| async move { step.run(query).await.map(|result| (idx, result)) })
            .collect();

        let start = Instant::now();
        let mut completed = Vec::with_capacity(steps.len());
        while let Some(outcome) = pending.next().await {
            let (idx, result) = outcome?;
            context.add_step(&result);
            completed.push((idx, result));
        }
        debug!(steps = completed.len(), duration_ms = elapsed_ms(start), "PERF retrieval");

        completed.sort_by_key(|(idx, _)| *idx);
        let steps = completed.into_iter().map(|(_, result)| result).collect();
        Ok((steps, context))
    }

    fn finish(
        request: ChatRequest,
        prepared: Prepared,
        answer: String,
        token_usage: TokenUsage,
        generation_ms: f64,
    ) -> ChatResponse {
        ChatResponse {
            chat_session_id: None,
            response: answer,
            documents: prepared.context.documents(),
            request: request.query,
            rendered_prompt: Some(prepared.prompt.rendered),
            model: request.model,
            response_duration_ms: generation_ms,
            token_usage,
            steps: prepared.steps,
        }
    }
}
