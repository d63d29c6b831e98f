//! Retriever descriptors and per-step retrieval configuration

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::validation::{validate_threshold, validate_top_k, RetrievalValidationError};
use crate::domain::EmbeddingModel;

pub const DEFAULT_CONTEXT_KEY: &str = "context";
pub const DEFAULT_TOP_K: u32 = 5;
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Backend a retriever searches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrieverKind {
    Vector,
    Graph,
}

impl fmt::Display for RetrieverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vector => write!(f, "vector"),
            Self::Graph => write!(f, "graph"),
        }
    }
}

/// Wire form of a retriever descriptor, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRetrieverDescriptor {
    retriever_name: String,
    retriever_type: RetrieverKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index_name: Option<String>,
    #[serde(default)]
    embedding_model: EmbeddingModel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    retriever_select: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field_mappings: Option<BTreeMap<String, String>>,
}

/// Describes one retriever: which backend, which index and how backend
/// rows map onto search results.
///
/// Only constructible in a valid state: vector retrievers always carry an
/// index name, a non-empty select list and non-empty field mappings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRetrieverDescriptor", into = "RawRetrieverDescriptor")]
pub struct RetrieverDescriptor {
    name: String,
    kind: RetrieverKind,
    index_name: Option<String>,
    embedding_model: EmbeddingModel,
    select_fields: Vec<String>,
    field_mappings: BTreeMap<String, String>,
}

impl RetrieverDescriptor {
    /// Create a vector retriever
    pub fn vector(
        name: impl Into<String>,
        index_name: impl Into<String>,
        embedding_model: EmbeddingModel,
        select_fields: Vec<String>,
        field_mappings: BTreeMap<String, String>,
    ) -> Result<Self, RetrievalValidationError> {
        Self::validated(RawRetrieverDescriptor {
            retriever_name: name.into(),
            retriever_type: RetrieverKind::Vector,
            index_name: Some(index_name.into()),
            embedding_model,
            retriever_select: Some(select_fields),
            field_mappings: Some(field_mappings),
        })
    }

    /// Create a graph retriever
    pub fn graph(
        name: impl Into<String>,
        embedding_model: EmbeddingModel,
    ) -> Result<Self, RetrievalValidationError> {
        Self::validated(RawRetrieverDescriptor {
            retriever_name: name.into(),
            retriever_type: RetrieverKind::Graph,
            index_name: None,
            embedding_model,
            retriever_select: None,
            field_mappings: None,
        })
    }

    fn validated(raw: RawRetrieverDescriptor) -> Result<Self, RetrievalValidationError> {
        if raw.retriever_name.trim().is_empty() {
            return Err(RetrievalValidationError::EmptyRetrieverName);
        }

        let index_name = raw.index_name.filter(|i| !i.is_empty());
        let select_fields = raw.retriever_select.unwrap_or_default();
        let field_mappings = raw.field_mappings.unwrap_or_default();

        if raw.retriever_type == RetrieverKind::Vector {
            if index_name.is_none() {
                return Err(RetrievalValidationError::MissingVectorField {
                    field: "index_name",
                });
            }
            if select_fields.is_empty() {
                return Err(RetrievalValidationError::MissingVectorField {
                    field: "retriever_select",
                });
            }
            if field_mappings.is_empty() {
                return Err(RetrievalValidationError::MissingVectorField {
                    field: "field_mappings",
                });
            }
        }

        Ok(Self {
            name: raw.retriever_name,
            kind: raw.retriever_type,
            index_name,
            embedding_model: raw.embedding_model,
            select_fields,
            field_mappings,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RetrieverKind {
        self.kind
    }

    pub fn index_name(&self) -> Option<&str> {
        self.index_name.as_deref()
    }

    pub fn embedding_model(&self) -> EmbeddingModel {
        self.embedding_model
    }

    pub fn select_fields(&self) -> &[String] {
        &self.select_fields
    }

    /// Target field (`name`, `summary`, `content`) to backend path
    pub fn field_mappings(&self) -> &BTreeMap<String, String> {
        &self.field_mappings
    }
}

impl TryFrom<RawRetrieverDescriptor> for RetrieverDescriptor {
    type Error = RetrievalValidationError;

    fn try_from(raw: RawRetrieverDescriptor) -> Result<Self, Self::Error> {
        Self::validated(raw)
    }
}

impl From<RetrieverDescriptor> for RawRetrieverDescriptor {
    fn from(d: RetrieverDescriptor) -> Self {
        let is_vector = d.kind == RetrieverKind::Vector;
        Self {
            retriever_name: d.name,
            retriever_type: d.kind,
            index_name: d.index_name,
            embedding_model: d.embedding_model,
            retriever_select: (is_vector || !d.select_fields.is_empty()).then_some(d.select_fields),
            field_mappings: (is_vector || !d.field_mappings.is_empty()).then_some(d.field_mappings),
        }
    }
}

/// Query transformation applied before retrieval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum PreRetrievalType {
    #[default]
    Default,
    QueryExpansion,
    RewriteRetrieveRead,
    StepBackPrompting,
    Hyde,
    RephraseAndRespond,
}

impl PreRetrievalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::QueryExpansion => "query_expansion",
            Self::RewriteRetrieveRead => "rewrite_retrieve_read",
            Self::StepBackPrompting => "step_back_prompting",
            Self::Hyde => "hyde",
            Self::RephraseAndRespond => "rephrase_and_respond",
        }
    }
}

/// Unknown tags resolve to `Default` rather than failing the request
impl From<String> for PreRetrievalType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "default" => Self::Default,
            "query_expansion" => Self::QueryExpansion,
            "rewrite_retrieve_read" => Self::RewriteRetrieveRead,
            "step_back_prompting" => Self::StepBackPrompting,
            "hyde" => Self::Hyde,
            "rephrase_and_respond" => Self::RephraseAndRespond,
            other => {
                warn!(tag = %other, "Unknown pre-retrieval type, using default");
                Self::Default
            }
        }
    }
}

/// Refinement applied to retrieved documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum PostRetrievalType {
    #[default]
    Default,
}

impl PostRetrievalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
        }
    }
}

impl From<String> for PostRetrievalType {
    fn from(tag: String) -> Self {
        if tag != "default" {
            warn!(tag = %tag, "Unknown post-retrieval type, using default");
        }
        Self::Default
    }
}

/// Wire form of a retrieval configuration, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRetrievalConfig {
    retriever: RetrieverDescriptor,
    #[serde(default = "default_context_key")]
    context_key: String,
    #[serde(default)]
    pre_retrieval_type: PreRetrievalType,
    #[serde(default)]
    post_retrieval_type: PostRetrievalType,
    #[serde(default = "default_top_k")]
    top_k: u32,
    #[serde(default = "default_threshold")]
    threshold: f64,
}

fn default_context_key() -> String {
    DEFAULT_CONTEXT_KEY.to_string()
}

fn default_top_k() -> u32 {
    DEFAULT_TOP_K
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

/// One configured retrieval step of a chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRetrievalConfig", into = "RawRetrievalConfig")]
pub struct RetrievalConfig {
    retriever: RetrieverDescriptor,
    context_key: String,
    pre_retrieval_type: PreRetrievalType,
    post_retrieval_type: PostRetrievalType,
    top_k: u32,
    threshold: f64,
}

impl RetrievalConfig {
    /// Create a configuration with default key, strategies, top_k and threshold
    pub fn new(retriever: RetrieverDescriptor) -> Self {
        Self {
            retriever,
            context_key: default_context_key(),
            pre_retrieval_type: PreRetrievalType::Default,
            post_retrieval_type: PostRetrievalType::Default,
            top_k: DEFAULT_TOP_K,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    pub fn with_context_key(
        mut self,
        key: impl Into<String>,
    ) -> Result<Self, RetrievalValidationError> {
        let key = key.into();
        if key.is_empty() {
            return Err(RetrievalValidationError::EmptyContextKey);
        }
        self.context_key = key;
        Ok(self)
    }

    pub fn with_pre_retrieval(mut self, kind: PreRetrievalType) -> Self {
        self.pre_retrieval_type = kind;
        self
    }

    pub fn with_post_retrieval(mut self, kind: PostRetrievalType) -> Self {
        self.post_retrieval_type = kind;
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Result<Self, RetrievalValidationError> {
        validate_top_k(top_k)?;
        self.top_k = top_k;
        Ok(self)
    }

    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, RetrievalValidationError> {
        validate_threshold(threshold)?;
        self.threshold = threshold;
        Ok(self)
    }

    pub fn retriever(&self) -> &RetrieverDescriptor {
        &self.retriever
    }

    pub fn context_key(&self) -> &str {
        &self.context_key
    }

    pub fn pre_retrieval_type(&self) -> PreRetrievalType {
        self.pre_retrieval_type
    }

    pub fn post_retrieval_type(&self) -> PostRetrievalType {
        self.post_retrieval_type
    }

    pub fn top_k(&self) -> u32 {
        self.top_k
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl TryFrom<RawRetrievalConfig> for RetrievalConfig {
    type Error = RetrievalValidationError;

    fn try_from(raw: RawRetrievalConfig) -> Result<Self, Self::Error> {
        Self::new(raw.retriever)
            .with_context_key(raw.context_key)?
            .with_pre_retrieval(raw.pre_retrieval_type)
            .with_post_retrieval(raw.post_retrieval_type)
            .with_top_k(raw.top_k)?
            .with_threshold(raw.threshold)
    }
}

impl From<RetrievalConfig> for RawRetrievalConfig {
    fn from(c: RetrievalConfig) -> Self {
        Self {
            retriever: c.retriever,
            context_key: c.context_key,
            pre_retrieval_type: c.pre_retrieval_type,
            post_retrieval_type: c.post_retrieval_type,
            top_k: c.top_k,
            threshold: c.threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mappings() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("name".to_string(), "name".to_string()),
            ("content".to_string(), "content".to_string()),
        ])
    }

    #[test]
    fn test_vector_descriptor_requires_index_select_and_mappings() {
        let err = RetrieverDescriptor::vector(
            "docs",
            "",
            EmbeddingModel::default(),
            vec!["content".to_string()],
            mappings(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RetrievalValidationError::MissingVectorField {
                field: "index_name"
            }
        );

        let err = RetrieverDescriptor::vector(
            "docs",
            "docs-index",
            EmbeddingModel::default(),
            vec![],
            mappings(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RetrievalValidationError::MissingVectorField {
                field: "retriever_select"
            }
        );

        let err = RetrieverDescriptor::vector(
            "docs",
            "docs-index",
            EmbeddingModel::default(),
            vec!["content".to_string()],
            BTreeMap::new(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            RetrievalValidationError::MissingVectorField {
                field: "field_mappings"
            }
        );
    }

    #[test]
    fn test_graph_descriptor_needs_no_vector_fields() {
        let descriptor = RetrieverDescriptor::graph("interfaces", EmbeddingModel::default()).unwrap();

        assert_eq!(descriptor.kind(), RetrieverKind::Graph);
        assert!(descriptor.index_name().is_none());
        assert!(descriptor.select_fields().is_empty());
    }

    #[test]
    fn test_descriptor_deserialization_is_validated() {
        let result: Result<RetrieverDescriptor, _> = serde_json::from_value(json!({
            "retriever_name": "docs",
            "retriever_type": "vector",
            "index_name": "docs-index"
        }));
        assert!(result.is_err());

        let descriptor: RetrieverDescriptor = serde_json::from_value(json!({
            "retriever_name": "docs",
            "retriever_type": "vector",
            "index_name": "docs-index",
            "retriever_select": ["name", "content"],
            "field_mappings": {"name": "metadata.title", "content": "chunk"}
        }))
        .unwrap();
        assert_eq!(descriptor.embedding_model(), EmbeddingModel::TextEmbedding3Large);
        assert_eq!(descriptor.field_mappings()["name"], "metadata.title");
    }

    #[test]
    fn test_retrieval_config_defaults() {
        let config: RetrievalConfig = serde_json::from_value(json!({
            "retriever": {"retriever_name": "graph", "retriever_type": "graph"}
        }))
        .unwrap();

        assert_eq!(config.context_key(), "context");
        assert_eq!(config.top_k(), 5);
        assert_eq!(config.threshold(), 0.5);
        assert_eq!(config.pre_retrieval_type(), PreRetrievalType::Default);
        assert_eq!(config.post_retrieval_type(), PostRetrievalType::Default);
    }

    #[test]
    fn test_retrieval_config_rejects_out_of_range_values() {
        let base = json!({"retriever_name": "graph", "retriever_type": "graph"});

        let zero_top_k: Result<RetrievalConfig, _> =
            serde_json::from_value(json!({"retriever": base, "top_k": 0}));
        assert!(zero_top_k.is_err());

        let bad_threshold: Result<RetrievalConfig, _> =
            serde_json::from_value(json!({"retriever": base, "threshold": 1.5}));
        assert!(bad_threshold.is_err());
    }

    #[test]
    fn test_unknown_strategy_tags_fall_back_to_default() {
        let pre: PreRetrievalType = serde_json::from_str("\"chain_of_thought\"").unwrap();
        assert_eq!(pre, PreRetrievalType::Default);

        let pre: PreRetrievalType = serde_json::from_str("\"hyde\"").unwrap();
        assert_eq!(pre, PreRetrievalType::Hyde);

        let post: PostRetrievalType = serde_json::from_str("\"rerank\"").unwrap();
        assert_eq!(post, PostRetrievalType::Default);
    }
}
