//! Chat endpoints

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{error, info};
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{ChatRecord, ChatRecordRepository, ChatRequest, ChatResponse, DomainError, StreamEvent};

#[derive(Debug, Deserialize)]
pub struct ChatQueryParams {
    /// Continue an existing chat session instead of starting one
    pub chat_id: Option<String>,
}

fn session_id(params: ChatQueryParams) -> String {
    match params.chat_id {
        Some(id) => {
            info!(chat_id = %id, "Continuing chat");
            id
        }
        None => {
            let id = Uuid::new_v4().to_string();
            info!(chat_id = %id, "Starting new chat");
            id
        }
    }
}

/// Persisting the record is best effort; the answer is returned regardless
async fn store(records: &dyn ChatRecordRepository, response: ChatResponse) {
    if let Err(e) = records.insert(ChatRecord::new(response)).await {
        error!(error = %e, "Failed to store chat response");
    }
}

/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    Query(params): Query<ChatQueryParams>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let chat_id = session_id(params);

    let mut response = state.pipeline.run(request).await?;
    response.chat_session_id = Some(chat_id);

    store(state.chat_records.as_ref(), response.clone()).await;

    Ok(Json(response))
}

/// POST /chat/stream
///
/// Each stream event is sent as one SSE `data:` line. A failed run ends with
/// an `error` event carrying the API error body.
pub async fn chat_stream(
    State(state): State<AppState>,
    Query(params): Query<ChatQueryParams>,
    Json(request): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let chat_id = session_id(params);
    let records = state.chat_records.clone();

    let events = state.pipeline.run_streaming(request).then(move |item| {
        let records = records.clone();
        let chat_id = chat_id.clone();
        async move { Ok(to_event(item, &chat_id, records.as_ref()).await) }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

async fn to_event(
    item: Result<StreamEvent, DomainError>,
    chat_id: &str,
    records: &dyn ChatRecordRepository,
) -> Event {
    match item {
        Ok(StreamEvent::Final { mut metadata }) => {
            metadata.chat_session_id = Some(chat_id.to_string());
            store(records, (*metadata).clone()).await;
            encode(&StreamEvent::Final { metadata })
        }
        Ok(event) => encode(&event),
        Err(e) => {
            let api = ApiError::from(e);
            Event::default()
                .event("error")
                .data(serde_json::to_string(&api.response).unwrap_or_else(|_| api.to_string()))
        }
    }
}

fn encode(event: &StreamEvent) -> Event {
    match serde_json::to_string(event) {
        Ok(data) => Event::default().data(data),
        Err(e) => Event::default().event("error").data(e.to_string()),
    }
}
