use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Pipeline phase a failure originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    PreRetrieval,
    Embedding,
    Retrieval,
    PostRetrieval,
    PromptAssembly,
    Generation,
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PreRetrieval => "pre_retrieval",
            Self::Embedding => "embedding",
            Self::Retrieval => "retrieval",
            Self::PostRetrieval => "post_retrieval",
            Self::PromptAssembly => "prompt_assembly",
            Self::Generation => "generation",
        };
        f.write_str(name)
    }
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("{phase} failed: {source}")]
    Phase {
        phase: PipelinePhase,
        #[source]
        source: Box<DomainError>,
    },
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Tag an error with the pipeline phase it surfaced in.
    ///
    /// Errors already tagged keep their innermost phase.
    pub fn in_phase(self, phase: PipelinePhase) -> Self {
        match self {
            already @ Self::Phase { .. } => already,
            other => Self::Phase {
                phase,
                source: Box::new(other),
            },
        }
    }

    /// Phase the error was tagged with, if any
    pub fn phase(&self) -> Option<PipelinePhase> {
        match self {
            Self::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// The underlying error with any phase tag removed
    pub fn root(&self) -> &DomainError {
        match self {
            Self::Phase { source, .. } => source.root(),
            other => other,
        }
    }
}
