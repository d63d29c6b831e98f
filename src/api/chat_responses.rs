//! Stored chat responses

use axum::extract::{Query, State};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::ChatRecord;

#[derive(Debug, Deserialize)]
pub struct ChatResponseQuery {
    pub from: Option<DateTime<Utc>>,
    /// Defaults to now
    pub until: Option<DateTime<Utc>>,
}

/// GET /chat_response
pub async fn list_chat_responses(
    State(state): State<AppState>,
    Query(query): Query<ChatResponseQuery>,
) -> Result<Json<Vec<ChatRecord>>, ApiError> {
    let from = query.from.unwrap_or(DateTime::<Utc>::MIN_UTC);
    let until = query.until.unwrap_or_else(Utc::now);

    if from > until {
        return Err(ApiError::bad_request("'from' must not be after 'until'").with_param("from"));
    }

    debug!(%from, %until, "Listing chat responses");

    let records = state.chat_records.list_between(from, until).await?;
    Ok(Json(records))
}
