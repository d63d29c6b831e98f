//! Infrastructure layer - Backend clients, strategies and the pipeline

pub mod embedding;
pub mod http_client;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod retrieval;
pub mod search;
