//! Chat and embedding models served by the Azure OpenAI deployments

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Azure region a deployment lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentRegion {
    Primary,
    Secondary,
}

/// Chat completion models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChatModel {
    #[serde(rename = "gpt-35-turbo")]
    Gpt35Turbo,
    #[serde(rename = "gpt-4")]
    Gpt4,
    #[serde(rename = "gpt-4-32k")]
    Gpt4_32k,
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,
    #[default]
    #[serde(rename = "gpt-4o")]
    Gpt4o,
}

impl ChatModel {
    pub const ALL: [ChatModel; 5] = [
        Self::Gpt35Turbo,
        Self::Gpt4,
        Self::Gpt4_32k,
        Self::Gpt4Turbo,
        Self::Gpt4o,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gpt35Turbo => "gpt-35-turbo",
            Self::Gpt4 => "gpt-4",
            Self::Gpt4_32k => "gpt-4-32k",
            Self::Gpt4Turbo => "gpt-4-turbo",
            Self::Gpt4o => "gpt-4o",
        }
    }

    /// Underlying model name, used to pick a tokenizer
    pub fn model_name(&self) -> &'static str {
        match self {
            Self::Gpt4Turbo => "gpt-4",
            other => other.as_str(),
        }
    }

    pub fn deployment_name(&self) -> &'static str {
        self.as_str()
    }

    pub fn region(&self) -> DeploymentRegion {
        match self {
            Self::Gpt4Turbo => DeploymentRegion::Secondary,
            _ => DeploymentRegion::Primary,
        }
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatModel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("Unsupported chat model: {}", s)))
    }
}

/// Embedding models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EmbeddingModel {
    #[default]
    #[serde(rename = "text-embedding-3-large")]
    TextEmbedding3Large,
    #[serde(rename = "text-embedding-3-small")]
    TextEmbedding3Small,
    #[serde(rename = "text-embedding-ada-002")]
    TextEmbeddingAda002,
}

impl EmbeddingModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextEmbedding3Large => "text-embedding-3-large",
            Self::TextEmbedding3Small => "text-embedding-3-small",
            Self::TextEmbeddingAda002 => "text-embedding-ada-002",
        }
    }

    pub fn deployment_name(&self) -> &'static str {
        self.as_str()
    }

    pub fn dimensions(&self) -> usize {
        match self {
            Self::TextEmbedding3Large => 3072,
            Self::TextEmbedding3Small | Self::TextEmbeddingAda002 => 1536,
        }
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_model_default_is_gpt4o() {
        assert_eq!(ChatModel::default(), ChatModel::Gpt4o);
    }

    #[test]
    fn test_gpt4_turbo_deployment() {
        let model = ChatModel::Gpt4Turbo;

        assert_eq!(model.model_name(), "gpt-4");
        assert_eq!(model.deployment_name(), "gpt-4-turbo");
        assert_eq!(model.region(), DeploymentRegion::Secondary);
    }

    #[test]
    fn test_chat_model_serde_names() {
        let model: ChatModel = serde_json::from_str("\"gpt-35-turbo\"").unwrap();
        assert_eq!(model, ChatModel::Gpt35Turbo);
        assert_eq!(serde_json::to_string(&ChatModel::Gpt4_32k).unwrap(), "\"gpt-4-32k\"");
    }

    #[test]
    fn test_chat_model_from_str_rejects_unknown() {
        assert_eq!("gpt-4o".parse::<ChatModel>().unwrap(), ChatModel::Gpt4o);
        assert!("text-embedding-3-large".parse::<ChatModel>().is_err());
    }

    #[test]
    fn test_embedding_model_default() {
        let model = EmbeddingModel::default();

        assert_eq!(model.as_str(), "text-embedding-3-large");
        assert_eq!(model.dimensions(), 3072);
    }
}
