//! Shared API types

pub mod error;
pub mod json;
pub mod pagination;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
pub use pagination::PaginationParams;
