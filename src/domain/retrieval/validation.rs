//! Retrieval configuration validation utilities

use std::fmt;

use super::RetrieverKind;

/// Retrieval configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum RetrievalValidationError {
    /// Retriever name is empty
    EmptyRetrieverName,
    /// A vector retriever is missing one of its required fields
    MissingVectorField { field: &'static str },
    /// Context key is empty
    EmptyContextKey,
    /// top_k must be positive
    InvalidTopK { value: u32 },
    /// Threshold outside of [0, 1]
    InvalidThreshold { value: f64 },
}

impl fmt::Display for RetrievalValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRetrieverName => write!(f, "Retriever name cannot be empty"),
            Self::MissingVectorField { field } => {
                write!(
                    f,
                    "{} is required for {} retrievers",
                    field,
                    RetrieverKind::Vector
                )
            }
            Self::EmptyContextKey => write!(f, "Context key cannot be empty"),
            Self::InvalidTopK { value } => {
                write!(f, "Invalid top_k {}: must be greater than 0", value)
            }
            Self::InvalidThreshold { value } => {
                write!(
                    f,
                    "Invalid threshold {}: must be between 0.0 and 1.0",
                    value
                )
            }
        }
    }
}

impl std::error::Error for RetrievalValidationError {}

/// Validate the top_k of a retrieval configuration
pub fn validate_top_k(top_k: u32) -> Result<(), RetrievalValidationError> {
    if top_k == 0 {
        return Err(RetrievalValidationError::InvalidTopK { value: top_k });
    }

    Ok(())
}

/// Validate a similarity threshold
pub fn validate_threshold(threshold: f64) -> Result<(), RetrievalValidationError> {
    if !(0.0..=1.0).contains(&threshold) {
        return Err(RetrievalValidationError::InvalidThreshold { value: threshold });
    }

    Ok(())
}
