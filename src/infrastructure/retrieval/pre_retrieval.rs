//! Query transformations run before embedding

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::retrieval::{PreRetrievalStrategy, PreRetrievalType};
use crate::domain::{ChatModel, DomainError, LlmRequest, Message, ProviderResolver};

const QUERY_EXPANSION_REPEAT: usize = 5;

const STEP_BACK_SYSTEM: &str = "You are an expert at world knowledge. Your task is to step back \
and paraphrase a question to a more generic step-back question, which is easier to answer. \
Here are a few examples:";

const STEP_BACK_EXAMPLES: [(&str, &str); 2] = [
    (
        "Could the members of The Police perform lawful arrests?",
        "what can the members of The Police do?",
    ),
    (
        "Jan Sindel's was born in what country?",
        "what is Jan Sindel's personal history?",
    ),
];

/// The model used to transform queries, shared by all LLM-backed strategies
#[derive(Debug, Clone)]
pub struct TransformationLlm {
    resolver: Arc<dyn ProviderResolver>,
    model: ChatModel,
}

impl TransformationLlm {
    pub fn new(resolver: Arc<dyn ProviderResolver>, model: ChatModel) -> Self {
        Self { resolver, model }
    }

    /// Single completion attempt; failures propagate to the caller
    async fn complete(&self, messages: Vec<Message>) -> Result<String, DomainError> {
        let provider = self.resolver.resolve(self.model).await?;
        let request = LlmRequest::deterministic(messages);

        let response = provider
            .chat(self.model.deployment_name(), request)
            .await?;

        Ok(response.content().to_string())
    }
}

/// Passes the query through unchanged
#[derive(Debug, Default)]
pub struct DefaultPreRetrieval;

#[async_trait]
impl PreRetrievalStrategy for DefaultPreRetrieval {
    async fn execute_async(&self, query: &str) -> Result<String, DomainError> {
        Ok(query.to_string())
    }

    fn execute(&self, query: &str) -> Result<String, DomainError> {
        Ok(query.to_string())
    }

    fn kind(&self) -> PreRetrievalType {
        PreRetrievalType::Default
    }
}

/// Answers the query and prefixes the answer with the query repeated five times
#[derive(Debug)]
pub struct QueryExpansion {
    llm: TransformationLlm,
}

#[async_trait]
impl PreRetrievalStrategy for QueryExpansion {
    async fn execute_async(&self, query: &str) -> Result<String, DomainError> {
        let answer = self
            .llm
            .complete(vec![
                Message::system("Query expansion is required"),
                Message::user(format!(
                    "Answer the following query: {}\nGive the rationale before answering",
                    query
                )),
            ])
            .await?;

        Ok(format!("{} ", query).repeat(QUERY_EXPANSION_REPEAT) + &answer)
    }

    fn kind(&self) -> PreRetrievalType {
        PreRetrievalType::QueryExpansion
    }
}

/// Rewrites the query into several search-engine queries.
///
/// The raw model output (`;`-separated, `**`-terminated) is returned as is.
#[derive(Debug)]
pub struct RewriteRetrieveRead {
    llm: TransformationLlm,
}

#[async_trait]
impl PreRetrievalStrategy for RewriteRetrieveRead {
    async fn execute_async(&self, query: &str) -> Result<String, DomainError> {
        self.llm
            .complete(vec![
                Message::system("You rewrite questions into search queries."),
                Message::user(format!(
                    "Provide better search queries for a vector database search engine to \
                     answer the given question. Separate multiple queries with ';' and end \
                     the queries with '**'.\nQuestion: {}\nAnswer:",
                    query
                )),
            ])
            .await
    }

    fn kind(&self) -> PreRetrievalType {
        PreRetrievalType::RewriteRetrieveRead
    }
}

/// Paraphrases the query into a more generic step-back question
#[derive(Debug)]
pub struct StepBackPrompting {
    llm: TransformationLlm,
}

#[async_trait]
impl PreRetrievalStrategy for StepBackPrompting {
    async fn execute_async(&self, query: &str) -> Result<String, DomainError> {
        let mut messages = vec![Message::system(STEP_BACK_SYSTEM)];
        for (question, step_back) in STEP_BACK_EXAMPLES {
            messages.push(Message::user(question));
            messages.push(Message::assistant(step_back));
        }
        messages.push(Message::user(query));

        self.llm.complete(messages).await
    }

    fn kind(&self) -> PreRetrievalType {
        PreRetrievalType::StepBackPrompting
    }
}

/// Replaces the query with a hypothetical document answering it
#[derive(Debug)]
pub struct Hyde {
    llm: TransformationLlm,
}

#[async_trait]
impl PreRetrievalStrategy for Hyde {
    async fn execute_async(&self, query: &str) -> Result<String, DomainError> {
        self.llm
            .complete(vec![
                Message::system("You are a technical writer."),
                Message::user(format!(
                    "Please write a short passage of documentation that answers the \
                     question.\nQuestion: {}\nPassage:",
                    query
                )),
            ])
            .await
    }

    fn kind(&self) -> PreRetrievalType {
        PreRetrievalType::Hyde
    }
}

/// Rephrases and expands the query
#[derive(Debug)]
pub struct RephraseAndRespond {
    llm: TransformationLlm,
}

#[async_trait]
impl PreRetrievalStrategy for RephraseAndRespond {
    async fn execute_async(&self, query: &str) -> Result<String, DomainError> {
        self.llm
            .complete(vec![Message::user(format!(
                "\"{}\"\nRephrase and expand the question to help you answer it better. \
                 Reply with the rephrased question only.",
                query
            ))])
            .await
    }

    fn kind(&self) -> PreRetrievalType {
        PreRetrievalType::RephraseAndRespond
    }
}

/// Factory for pre-retrieval strategies
#[derive(Debug)]
pub struct PreRetrievalFactory;

impl PreRetrievalFactory {
    pub fn create(kind: PreRetrievalType, llm: &TransformationLlm) -> Arc<dyn PreRetrievalStrategy> {
        debug!(kind = kind.as_str(), "Creating pre-retrieval strategy");
        let llm = llm.clone();

        match kind {
            PreRetrievalType::Default => Arc::new(DefaultPreRetrieval),
            PreRetrievalType::QueryExpansion => Arc::new(QueryExpansion { llm }),
            PreRetrievalType::RewriteRetrieveRead => Arc::new(RewriteRetrieveRead { llm }),
            PreRetrievalType::StepBackPrompting => Arc::new(StepBackPrompting { llm }),
            PreRetrievalType::Hyde => Arc::new(Hyde { llm }),
            PreRetrievalType::RephraseAndRespond => Arc::new(RephraseAndRespond { llm }),
        }
    }
}
