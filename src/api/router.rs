use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use super::chat;
use super::chat_responses;
use super::health;
use super::prompt_templates;
use super::retriever_configs;
use super::state::AppState;

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health endpoints
        .route("/", get(health::ping))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        // Chat
        .route("/chat", post(chat::chat))
        .route("/chat/stream", post(chat::chat_stream))
        .route("/chat_response", get(chat_responses::list_chat_responses))
        // Prompt templates
        .route(
            "/prompt_template",
            get(prompt_templates::list_templates).post(prompt_templates::create_template),
        )
        .route(
            "/prompt_template/{template}",
            get(prompt_templates::get_template)
                .put(prompt_templates::update_template)
                .delete(prompt_templates::delete_template),
        )
        // Retriever descriptors
        .route(
            "/retriever_config",
            get(retriever_configs::list_retrievers).post(retriever_configs::create_retriever),
        )
        .route(
            "/retriever_config/{config_id}",
            get(retriever_configs::get_retriever)
                .put(retriever_configs::update_retriever)
                .delete(retriever_configs::delete_retriever),
        )
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
}
