//! API layer - HTTP endpoints

pub mod chat;
pub mod chat_responses;
pub mod health;
pub mod prompt_templates;
pub mod retriever_configs;
pub mod router;
pub mod state;
pub mod types;

pub use router::create_router;
pub use state::AppState;
