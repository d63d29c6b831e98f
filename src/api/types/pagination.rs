use serde::Deserialize;

use super::ApiError;

/// `skip`/`limit` query parameters of list endpoints
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: default_limit(),
        }
    }
}

impl PaginationParams {
    pub fn validate(self) -> Result<Self, ApiError> {
        if self.limit == 0 {
            return Err(ApiError::bad_request("limit must be at least 1").with_param("limit"));
        }
        Ok(self)
    }
}
